//! Saved form commands

use anyhow::Context;
use colored::Colorize;
use std::sync::Arc;
use tabled::Tabled;

use formwright_core::{FormBuilder, FormDefinition, FormField, FormRepository};

use super::find_form;
use crate::{output::OutputFormat, FormCommands};

#[derive(Tabled)]
pub struct FormRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Fields")]
    pub fields: usize,
    #[tabled(rename = "Created")]
    pub created: String,
}

impl From<&FormDefinition> for FormRow {
    fn from(form: &FormDefinition) -> Self {
        Self {
            id: form.id().to_string(),
            name: form.name().to_string(),
            fields: form.fields().len(),
            created: form.created_at().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Type")]
    pub field_type: String,
    #[tabled(rename = "Rules")]
    pub rules: String,
    #[tabled(rename = "Options / Formula")]
    pub detail: String,
    #[tabled(rename = "ID")]
    pub id: String,
}

impl FieldRow {
    fn new(position: usize, field: &FormField) -> Self {
        let rules: Vec<String> = field
            .validations
            .iter()
            .map(|r| match r.threshold {
                Some(n) if r.kind.uses_threshold() => format!("{}({})", r.kind.as_str(), n),
                _ => r.kind.as_str().to_string(),
            })
            .collect();
        let detail = if field.is_derived {
            format!("= {}", field.derived_formula)
        } else {
            field.options.join(", ")
        };
        Self {
            position,
            label: field.label.clone(),
            field_type: field.field_type.to_string(),
            rules: rules.join(" "),
            detail,
            id: field.id.clone(),
        }
    }
}

pub async fn handle(action: FormCommands, repo: Arc<dyn FormRepository>, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        FormCommands::List => {
            let forms = repo.list().await?;
            let rows: Vec<FormRow> = forms.iter().map(FormRow::from).collect();
            format.print(rows, &forms)?;
        }
        FormCommands::Show { form } => {
            let form = find_form(repo.as_ref(), &form).await?;
            if format == OutputFormat::Table {
                println!("{} {}", form.name().bold(), form.id().dimmed());
            }
            let rows: Vec<FieldRow> = form
                .fields()
                .iter()
                .enumerate()
                .map(|(i, f)| FieldRow::new(i, f))
                .collect();
            format.print(rows, &form)?;
        }
        FormCommands::Create { name } => {
            let builder = FormBuilder::new(repo, name);
            builder.save().await?;
            println!("Created form: {}", builder.draft().id());
        }
        FormCommands::Import { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let form: FormDefinition = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a form definition", file.display()))?;
            repo.save(&form).await?;
            println!("Imported form {:?}: {}", form.name(), form.id());
        }
        FormCommands::Export { form, output } => {
            let form = find_form(repo.as_ref(), &form).await?;
            let json = serde_json::to_string_pretty(&form)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported {:?} to {}", form.name(), path.display());
                }
                None => println!("{}", json),
            }
        }
        FormCommands::Delete { form } => {
            let form = find_form(repo.as_ref(), &form).await?;
            repo.delete_by_id(form.id()).await?;
            println!("Deleted form: {}", form.id());
        }
        FormCommands::Restore => match FormBuilder::restore(repo).await? {
            Some(builder) => {
                builder.save().await?;
                println!(
                    "{} Restored draft {:?} ({} fields): {}",
                    "OK".green(),
                    builder.draft().name(),
                    builder.draft().fields().len(),
                    builder.draft().id()
                );
            }
            None => println!("No auto-saved draft"),
        },
    }
    Ok(())
}
