//! Form preview

use anyhow::Context;
use colored::Colorize;
use std::sync::Arc;
use tabled::Tabled;

use formwright_core::{FieldValue, FormRepository, FormSession, SubmitResult};

use super::{field_id, find_form};
use crate::output::OutputFormat;

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Field")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Error")]
    error: String,
}

pub async fn handle(
    form: &str,
    assignments: &[String],
    submit: bool,
    repo: Arc<dyn FormRepository>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let definition = find_form(repo.as_ref(), form).await?;
    let mut session = FormSession::new(repo, definition);

    for assignment in assignments {
        let (key, raw) = split_assignment(assignment)?;
        let id = field_id(session.definition(), key)?;
        let multi = session
            .definition()
            .field(&id)
            .is_some_and(|f| f.field_type.is_multi_value());
        session.set_value(&id, parse_value(raw, multi))?;
    }

    let result = submit.then(|| session.submit());
    let rows: Vec<ValueRow> = session
        .definition()
        .fields()
        .iter()
        .map(|f| {
            let mut label = f.label.clone();
            if f.is_derived {
                label.push_str(" (=)");
            }
            ValueRow {
                label,
                value: session.value(&f.id).map(ToString::to_string).unwrap_or_default(),
                error: session.error(&f.id).to_string(),
            }
        })
        .collect();

    match &result {
        Some(result) => format.print(rows, result)?,
        None => format.print(rows, &session.snapshot())?,
    }

    match result {
        Some(SubmitResult::Rejected { errors }) => {
            anyhow::bail!("submission rejected: {} field(s) failed validation", errors.len())
        }
        Some(SubmitResult::Accepted { .. }) if format == OutputFormat::Table => {
            println!("{} Submission accepted", "OK".green().bold());
        }
        _ => {}
    }
    Ok(())
}

fn split_assignment(assignment: &str) -> anyhow::Result<(&str, &str)> {
    assignment
        .split_once('=')
        .map(|(key, value)| (key.trim(), value))
        .with_context(|| format!("expected LABEL=VALUE, got {:?}", assignment))
}

/// Checkbox values are comma separated.
fn parse_value(raw: &str, multi: bool) -> FieldValue {
    if multi {
        FieldValue::Multi(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    } else {
        FieldValue::text(raw)
    }
}
