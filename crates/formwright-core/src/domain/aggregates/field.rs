//! Form field entity and its typed edits

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::value_objects::{
    new_id, FieldType, RuleFieldChange, ValidationKind, ValidationRule,
};
use crate::error::{FormsError, Result};

/// One input definition within a form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub validations: Vec<ValidationRule>,
    #[serde(default)]
    pub is_derived: bool,
    #[serde(default)]
    pub derived_formula: String,
    /// Labels the formula mentions. Informational only, the evaluator
    /// resolves labels from the formula text on every pass.
    #[serde(default)]
    pub derived_from_labels: BTreeSet<String>,
}

impl FormField {
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            field_type,
            label: label.into(),
            required: false,
            options: if field_type.is_choice() {
                default_options()
            } else {
                vec![]
            },
            validations: vec![],
            is_derived: false,
            derived_formula: String::new(),
            derived_from_labels: BTreeSet::new(),
        }
    }

    /// Derived field computing `formula`.
    pub fn derived(label: impl Into<String>, formula: impl Into<String>) -> Self {
        let mut field = Self::new(FieldType::Number, label);
        field.is_derived = true;
        field.derived_formula = formula.into();
        field
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        if rule.kind == ValidationKind::Required {
            self.required = true;
        }
        self.validations.push(rule);
        self
    }

    pub fn has_rule(&self, kind: ValidationKind) -> bool {
        self.validations.iter().any(|r| r.kind == kind)
    }

    /// Whether the evaluator should compute this field.
    pub fn has_formula(&self) -> bool {
        self.is_derived && !self.derived_formula.trim().is_empty()
    }

    /// Apply one edit. Rejected edits leave the field untouched.
    pub fn apply_update(&mut self, update: FieldUpdate) -> Result<()> {
        match update {
            FieldUpdate::SetLabel(label) => self.label = label,
            FieldUpdate::SetType(field_type) => {
                self.field_type = field_type;
                if !field_type.is_choice() {
                    self.options.clear();
                } else if self.options.is_empty() {
                    self.options = default_options();
                }
            }
            FieldUpdate::SetOptions(options) => self.options = clean_options(options),
            FieldUpdate::SetRequired(required) => {
                self.required = required;
                if required && !self.has_rule(ValidationKind::Required) {
                    self.validations.push(ValidationRule::required());
                } else if !required {
                    self.validations.retain(|r| r.kind != ValidationKind::Required);
                }
            }
            FieldUpdate::SetDerived(derived) => self.is_derived = derived,
            FieldUpdate::SetFormula(formula) => self.derived_formula = formula,
            FieldUpdate::AddValidation { kind, threshold } => {
                if self.has_rule(kind) {
                    return Err(FormsError::DuplicateRule {
                        field_id: self.id.clone(),
                        kind,
                    });
                }
                if kind == ValidationKind::Required {
                    self.required = true;
                }
                self.validations.push(ValidationRule::new(kind, threshold));
            }
            FieldUpdate::UpdateValidationField { index, change } => {
                let rule = self.validations.get_mut(index).ok_or_else(|| {
                    FormsError::ValidationRuleNotFound {
                        field_id: self.id.clone(),
                        index,
                    }
                })?;
                match change {
                    RuleFieldChange::Threshold(threshold) => rule.threshold = threshold,
                    RuleFieldChange::Message(message) => rule.message = message,
                }
            }
            FieldUpdate::RemoveValidation { index } => {
                if index >= self.validations.len() {
                    return Err(FormsError::ValidationRuleNotFound {
                        field_id: self.id.clone(),
                        index,
                    });
                }
                let removed = self.validations.remove(index);
                if removed.kind == ValidationKind::Required {
                    self.required = false;
                }
            }
        }
        Ok(())
    }
}

/// Typed edit of a single field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldUpdate {
    SetLabel(String),
    SetType(FieldType),
    SetOptions(Vec<String>),
    SetRequired(bool),
    SetDerived(bool),
    SetFormula(String),
    AddValidation {
        kind: ValidationKind,
        threshold: Option<u32>,
    },
    UpdateValidationField {
        index: usize,
        change: RuleFieldChange,
    },
    RemoveValidation {
        index: usize,
    },
}

fn default_options() -> Vec<String> {
    vec!["Option 1".to_string(), "Option 2".to_string()]
}

fn clean_options(options: Vec<String>) -> Vec<String> {
    options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_validation_rejected() {
        let mut field = FormField::new(FieldType::Text, "Name");
        field
            .apply_update(FieldUpdate::AddValidation {
                kind: ValidationKind::MinLength,
                threshold: Some(3),
            })
            .unwrap();

        let err = field
            .apply_update(FieldUpdate::AddValidation {
                kind: ValidationKind::MinLength,
                threshold: Some(5),
            })
            .unwrap_err();

        assert!(matches!(err, FormsError::DuplicateRule { kind: ValidationKind::MinLength, .. }));
        let min_rules: Vec<_> = field
            .validations
            .iter()
            .filter(|r| r.kind == ValidationKind::MinLength)
            .collect();
        assert_eq!(min_rules.len(), 1);
        assert_eq!(min_rules[0].threshold, Some(3));
    }

    #[test]
    fn test_required_flag_tracks_rule() {
        let mut field = FormField::new(FieldType::Text, "Name");
        field.apply_update(FieldUpdate::SetRequired(true)).unwrap();
        assert!(field.required);
        assert!(field.has_rule(ValidationKind::Required));

        // Turning it on twice keeps a single rule
        field.apply_update(FieldUpdate::SetRequired(true)).unwrap();
        assert_eq!(field.validations.len(), 1);

        field.apply_update(FieldUpdate::RemoveValidation { index: 0 }).unwrap();
        assert!(!field.required);
    }

    #[test]
    fn test_options_trimmed_and_cleared() {
        let mut field = FormField::new(FieldType::Select, "Color");
        assert_eq!(field.options, vec!["Option 1", "Option 2"]);

        field
            .apply_update(FieldUpdate::SetOptions(vec![
                " red ".into(),
                "".into(),
                "blue".into(),
                "red".into(),
            ]))
            .unwrap();
        assert_eq!(field.options, vec!["red", "blue", "red"]);

        field.apply_update(FieldUpdate::SetType(FieldType::Text)).unwrap();
        assert!(field.options.is_empty());
    }

    #[test]
    fn test_update_rule_message_and_threshold() {
        let mut field = FormField::new(FieldType::Text, "Code").with_rule(ValidationRule::max_length(4));
        field
            .apply_update(FieldUpdate::UpdateValidationField {
                index: 0,
                change: RuleFieldChange::Threshold(Some(6)),
            })
            .unwrap();
        field
            .apply_update(FieldUpdate::UpdateValidationField {
                index: 0,
                change: RuleFieldChange::Message("Too long".into()),
            })
            .unwrap();

        assert_eq!(field.validations[0].threshold, Some(6));
        assert_eq!(field.validations[0].message, "Too long");

        let err = field
            .apply_update(FieldUpdate::RemoveValidation { index: 3 })
            .unwrap_err();
        assert!(matches!(err, FormsError::ValidationRuleNotFound { index: 3, .. }));
    }
}
