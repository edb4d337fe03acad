//! Field editing commands

use clap::Subcommand;
use colored::Colorize;
use std::sync::Arc;

use formwright_core::{
    DerivedFieldEvaluator, FieldType, FieldUpdate, FormBuilder, FormField, FormRepository,
    RuleFieldChange, ValidationKind,
};

use super::{field_id, find_form};

#[derive(Debug, Clone, Subcommand)]
pub enum FieldEdit {
    /// Append a new field
    Add {
        /// text, number, textarea, select, radio, checkbox or date
        #[arg(value_parser = parse_field_type)]
        field_type: FieldType,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        required: bool,
        /// Choices for select, radio and checkbox fields
        #[arg(long, value_delimiter = ',')]
        options: Vec<String>,
    },
    /// Remove a field
    Remove { field: String },
    /// Move a field to a new position (0-based)
    Move { field: String, index: usize },
    /// Add, change or drop a validation rule
    Rule {
        field: String,
        /// required, minLength, maxLength, email or password
        #[arg(value_parser = parse_validation_kind)]
        kind: ValidationKind,
        #[arg(long)]
        threshold: Option<u32>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        remove: bool,
    },
    /// Compute a field from a formula over other field labels
    Derive {
        /// Existing field, or the label of a new number field
        field: String,
        formula: String,
    },
    /// Change field properties
    Set {
        field: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long = "type", value_parser = parse_field_type)]
        field_type: Option<FieldType>,
        #[arg(long, value_delimiter = ',')]
        options: Option<Vec<String>>,
        #[arg(long)]
        required: Option<bool>,
        #[arg(long)]
        derived: Option<bool>,
    },
}

fn parse_field_type(value: &str) -> Result<FieldType, String> {
    FieldType::parse(value).ok_or_else(|| {
        let known: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown field type {:?} (expected one of {})", value, known.join(", "))
    })
}

fn parse_validation_kind(value: &str) -> Result<ValidationKind, String> {
    ValidationKind::parse(value).ok_or_else(|| {
        let known: Vec<&str> = ValidationKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown rule {:?} (expected one of {})", value, known.join(", "))
    })
}

pub async fn handle(form: &str, edit: FieldEdit, repo: Arc<dyn FormRepository>) -> anyhow::Result<()> {
    let definition = find_form(repo.as_ref(), form).await?;
    let mut builder = FormBuilder::from_definition(repo, definition);
    let summary = apply(&mut builder, edit)?;
    builder.save().await?;
    println!("{} {}", "OK".green(), summary);
    warn_cycles(&builder);
    Ok(())
}

/// Apply one edit to the draft and describe what changed.
pub fn apply(builder: &mut FormBuilder, edit: FieldEdit) -> anyhow::Result<String> {
    match edit {
        FieldEdit::Add { field_type, label, required, options } => {
            let id = builder.add_field(field_type);
            if let Some(label) = label {
                builder.apply_update(&id, FieldUpdate::SetLabel(label))?;
            }
            if required {
                builder.apply_update(&id, FieldUpdate::SetRequired(true))?;
            }
            if !options.is_empty() {
                builder.apply_update(&id, FieldUpdate::SetOptions(options))?;
            }
            Ok(format!("Added {} field {}", field_type, id))
        }
        FieldEdit::Remove { field } => {
            let id = field_id(builder.draft(), &field)?;
            let removed = builder.remove_field(&id)?;
            Ok(format!("Removed field {:?}", removed.label))
        }
        FieldEdit::Move { field, index } => {
            let id = field_id(builder.draft(), &field)?;
            builder.move_field(&id, index)?;
            Ok(format!("Moved {:?} to position {}", field, index))
        }
        FieldEdit::Rule { field, kind, threshold, message, remove } => {
            let id = field_id(builder.draft(), &field)?;
            let existing = builder
                .draft()
                .field(&id)
                .and_then(|f| f.validations.iter().position(|r| r.kind == kind));

            match (existing, remove) {
                (Some(index), true) => {
                    builder.apply_update(&id, FieldUpdate::RemoveValidation { index })?;
                    Ok(format!("Removed {} rule from {:?}", kind.as_str(), field))
                }
                (None, true) => anyhow::bail!("{:?} has no {} rule", field, kind.as_str()),
                (Some(index), false) => {
                    if threshold.is_some() {
                        let change = RuleFieldChange::Threshold(threshold);
                        builder.apply_update(&id, FieldUpdate::UpdateValidationField { index, change })?;
                    }
                    if let Some(message) = message {
                        let change = RuleFieldChange::Message(message);
                        builder.apply_update(&id, FieldUpdate::UpdateValidationField { index, change })?;
                    }
                    Ok(format!("Updated {} rule on {:?}", kind.as_str(), field))
                }
                (None, false) => {
                    builder.apply_update(&id, FieldUpdate::AddValidation { kind, threshold })?;
                    if let Some(message) = message {
                        let index = builder.draft().field(&id).map_or(0, |f| f.validations.len() - 1);
                        let change = RuleFieldChange::Message(message);
                        builder.apply_update(&id, FieldUpdate::UpdateValidationField { index, change })?;
                    }
                    Ok(format!("Added {} rule to {:?}", kind.as_str(), field))
                }
            }
        }
        FieldEdit::Derive { field, formula } => match field_id(builder.draft(), &field) {
            Ok(id) => {
                builder.apply_update(&id, FieldUpdate::SetDerived(true))?;
                builder.apply_update(&id, FieldUpdate::SetFormula(formula.clone()))?;
                Ok(format!("{:?} = {}", field, formula))
            }
            Err(_) => {
                let id = builder.push_field(FormField::derived(field.clone(), formula.clone()));
                Ok(format!("Added derived field {} {:?} = {}", id, field, formula))
            }
        },
        FieldEdit::Set { field, label, field_type, options, required, derived } => {
            let id = field_id(builder.draft(), &field)?;
            let mut updates = Vec::new();
            if let Some(label) = label {
                updates.push(FieldUpdate::SetLabel(label));
            }
            if let Some(field_type) = field_type {
                updates.push(FieldUpdate::SetType(field_type));
            }
            if let Some(options) = options {
                updates.push(FieldUpdate::SetOptions(options));
            }
            if let Some(required) = required {
                updates.push(FieldUpdate::SetRequired(required));
            }
            if let Some(derived) = derived {
                updates.push(FieldUpdate::SetDerived(derived));
            }
            if updates.is_empty() {
                anyhow::bail!("nothing to change; pass --label, --type, --options, --required or --derived");
            }
            for update in updates {
                builder.apply_update(&id, update)?;
            }
            Ok(format!("Updated field {:?}", field))
        }
    }
}

pub fn warn_cycles(builder: &FormBuilder) {
    let draft = builder.draft();
    for cycle in DerivedFieldEvaluator::find_cycles(draft.fields()) {
        let labels: Vec<&str> = cycle
            .iter()
            .filter_map(|id| draft.field(id))
            .map(|f| f.label.as_str())
            .collect();
        println!(
            "{} derived fields depend on each other: {}",
            "warning:".yellow().bold(),
            labels.join(" -> ")
        );
    }
}
