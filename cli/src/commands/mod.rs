//! CLI Commands

pub mod config;
pub mod edit;
pub mod fields;
pub mod forms;
pub mod preview;

use anyhow::bail;
use formwright_core::{FormDefinition, FormRepository};

/// Find a saved form by id, falling back to an unambiguous name match.
pub async fn find_form(repo: &dyn FormRepository, key: &str) -> anyhow::Result<FormDefinition> {
    if let Some(form) = repo.get_by_id(key).await? {
        return Ok(form);
    }
    let mut matches: Vec<FormDefinition> = repo
        .list()
        .await?
        .into_iter()
        .filter(|f| f.name() == key)
        .collect();
    match matches.len() {
        0 => bail!("no saved form with id or name {:?}", key),
        1 => Ok(matches.remove(0)),
        n => bail!("{} forms are named {:?}; use the form id", n, key),
    }
}

/// Resolve a field by id or label.
pub fn field_id(form: &FormDefinition, key: &str) -> anyhow::Result<String> {
    form.field(key)
        .or_else(|| form.field_by_label(key))
        .map(|f| f.id.clone())
        .ok_or_else(|| anyhow::anyhow!("form {:?} has no field {:?}", form.name(), key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_core::{FieldType, FormField, InMemoryFormRepository};

    #[tokio::test]
    async fn test_find_form_by_id_or_name() {
        let repo = InMemoryFormRepository::new();
        let form = FormDefinition::create("Survey");
        repo.save(&form).await.unwrap();

        assert_eq!(find_form(&repo, form.id()).await.unwrap().id(), form.id());
        assert_eq!(find_form(&repo, "Survey").await.unwrap().id(), form.id());
        assert!(find_form(&repo, "Missing").await.is_err());

        repo.save(&FormDefinition::create("Survey")).await.unwrap();
        let err = find_form(&repo, "Survey").await.unwrap_err();
        assert!(err.to_string().contains("2 forms"));
    }

    #[test]
    fn test_field_id_by_label() {
        let mut form = FormDefinition::create("Order");
        let id = form.push_field(FormField::new(FieldType::Number, "Qty"));
        assert_eq!(field_id(&form, "Qty").unwrap(), id);
        assert_eq!(field_id(&form, &id).unwrap(), id);
        assert!(field_id(&form, "Price").is_err());
    }
}
