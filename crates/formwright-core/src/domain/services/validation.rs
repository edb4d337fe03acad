//! Validation engine
//!
//! Stateless checks of entered values against a field's ordered rule list.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::aggregates::FormField;
use crate::domain::value_objects::{FieldValue, FormErrors, FormValues, ValidationKind, ValidationRule};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const PASSWORD_MIN_CHARS: usize = 8;

pub struct ValidationEngine;

impl ValidationEngine {
    /// Check one rule. Returns the rule's message on failure, empty otherwise.
    ///
    /// Only `required` looks at empty or multi-valued input; every other kind
    /// passes on empty text and on selections.
    pub fn validate_rule(rule: &ValidationRule, value: &FieldValue) -> String {
        let failed = match (rule.kind, value) {
            (ValidationKind::Required, v) => v.is_empty(),
            (_, FieldValue::Multi(_)) => false,
            (_, FieldValue::Text(s)) if s.is_empty() => false,
            (ValidationKind::MinLength, FieldValue::Text(s)) => rule
                .threshold
                .map(|n| char_len(s) < n as usize)
                .unwrap_or(false),
            (ValidationKind::MaxLength, FieldValue::Text(s)) => rule
                .threshold
                .map(|n| char_len(s) > n as usize)
                .unwrap_or(false),
            (ValidationKind::Email, FieldValue::Text(s)) => !EMAIL_RE.is_match(s),
            (ValidationKind::Password, FieldValue::Text(s)) => {
                char_len(s) < PASSWORD_MIN_CHARS || !s.chars().any(|c| c.is_ascii_digit())
            }
        };

        if failed {
            rule.message.clone()
        } else {
            String::new()
        }
    }

    /// First failing rule's message in list order; later rules are not run.
    pub fn validate_field(field: &FormField, value: &FieldValue) -> String {
        field
            .validations
            .iter()
            .map(|rule| Self::validate_rule(rule, value))
            .find(|message| !message.is_empty())
            .unwrap_or_default()
    }

    /// Validate every field. Only fields with an error get an entry.
    pub fn validate_form(fields: &[FormField], values: &FormValues) -> FormErrors {
        fields
            .iter()
            .filter_map(|field| {
                let fallback;
                let value = match values.get(&field.id) {
                    Some(v) => v,
                    None => {
                        fallback = field.field_type.empty_value();
                        &fallback
                    }
                };
                let message = Self::validate_field(field, value);
                (!message.is_empty()).then(|| (field.id.clone(), message))
            })
            .collect()
    }

    pub fn has_errors(errors: &FormErrors) -> bool {
        errors.values().any(|message| !message.is_empty())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
