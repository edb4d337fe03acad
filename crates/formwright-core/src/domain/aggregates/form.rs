//! Form Aggregate
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::field::{FieldUpdate, FormField};
use crate::domain::value_objects::{new_id, FieldType};
use crate::error::{FormsError, Result};

/// Ordered collection of fields plus identifying metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    fields: Vec<FormField>,
}

impl FormDefinition {
    pub fn create(name: impl Into<String>) -> Self {
        Self { id: new_id(), name: name.into(), created_at: Utc::now(), fields: vec![] }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn fields(&self) -> &[FormField] { &self.fields }

    pub fn field(&self, field_id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// First field carrying `label`, in declaration order.
    pub fn field_by_label(&self, label: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.label == label)
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a new field of `field_type` with a placeholder label.
    pub fn add_field(&mut self, field_type: FieldType) -> String {
        let label = format!("New {} Field", capitalize(field_type.as_str()));
        self.push_field(FormField::new(field_type, label))
    }

    /// Append a prepared field. A field whose id is already taken gets a fresh one.
    pub fn push_field(&mut self, mut field: FormField) -> String {
        if self.field(&field.id).is_some() {
            field.id = new_id();
        }
        let id = field.id.clone();
        self.fields.push(field);
        self.refresh_dependencies();
        id
    }

    pub fn remove_field(&mut self, field_id: &str) -> Result<FormField> {
        let index = self.index_of(field_id)?;
        let removed = self.fields.remove(index);
        self.refresh_dependencies();
        Ok(removed)
    }

    /// Move a field to `new_index`, clamped to the end of the list.
    pub fn move_field(&mut self, field_id: &str, new_index: usize) -> Result<()> {
        let index = self.index_of(field_id)?;
        let field = self.fields.remove(index);
        let target = new_index.min(self.fields.len());
        self.fields.insert(target, field);
        Ok(())
    }

    pub fn apply_update(&mut self, field_id: &str, update: FieldUpdate) -> Result<()> {
        let index = self.index_of(field_id)?;
        self.fields[index].apply_update(update)?;
        self.refresh_dependencies();
        Ok(())
    }

    fn index_of(&self, field_id: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))
    }

    /// Recompute every derived field's informational label set.
    fn refresh_dependencies(&mut self) {
        let labels: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|f| (f.id.clone(), f.label.clone()))
            .collect();
        for field in &mut self.fields {
            field.derived_from_labels = if field.is_derived {
                labels
                    .iter()
                    .filter(|(id, label)| {
                        *id != field.id && !label.is_empty() && field.derived_formula.contains(label.as_str())
                    })
                    .map(|(_, label)| label.clone())
                    .collect()
            } else {
                Default::default()
            };
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ValidationKind;

    #[test]
    fn test_form() {
        let mut f = FormDefinition::create("Contact Form");
        let id = f.add_field(FieldType::Text);
        assert_eq!(f.fields().len(), 1);
        assert_eq!(f.field(&id).unwrap().label, "New Text Field");
    }

    #[test]
    fn test_move_and_remove() {
        let mut f = FormDefinition::create("Order");
        let a = f.add_field(FieldType::Text);
        let b = f.add_field(FieldType::Number);
        let c = f.add_field(FieldType::Date);

        f.move_field(&c, 0).unwrap();
        let order: Vec<&str> = f.fields().iter().map(|x| x.id.as_str()).collect();
        assert_eq!(order, vec![c.as_str(), a.as_str(), b.as_str()]);

        f.move_field(&c, 99).unwrap();
        assert_eq!(f.fields().last().unwrap().id, c);

        f.remove_field(&a).unwrap();
        assert!(f.field(&a).is_none());
        assert!(matches!(f.remove_field(&a), Err(FormsError::FieldNotFound(_))));
    }

    #[test]
    fn test_formula_dependencies_follow_labels() {
        let mut f = FormDefinition::create("Totals");
        f.push_field(FormField::new(FieldType::Number, "Price"));
        f.push_field(FormField::new(FieldType::Number, "Qty"));
        let total = f.push_field(FormField::new(FieldType::Number, "Total"));

        f.apply_update(&total, FieldUpdate::SetDerived(true)).unwrap();
        f.apply_update(&total, FieldUpdate::SetFormula("Price * Qty + Total".into()))
            .unwrap();

        let deps: Vec<&str> = f
            .field(&total)
            .unwrap()
            .derived_from_labels
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(deps, vec!["Price", "Qty"]);
    }

    #[test]
    fn test_duplicate_rule_leaves_form_unchanged() {
        let mut f = FormDefinition::create("Signup");
        let id = f.add_field(FieldType::Text);
        let add = FieldUpdate::AddValidation { kind: ValidationKind::Email, threshold: None };
        f.apply_update(&id, add.clone()).unwrap();
        let before = f.clone();

        assert!(f.apply_update(&id, add).is_err());
        assert_eq!(f, before);
    }

    #[test]
    fn test_serde_shape() {
        let mut f = FormDefinition::create("Shape");
        f.push_field(FormField::derived("Sum", "1 + 1"));
        let json = serde_json::to_value(&f).unwrap();
        assert!(json["createdAt"].is_string());
        assert_eq!(json["fields"][0]["type"], "number");
        assert_eq!(json["fields"][0]["isDerived"], true);
        assert_eq!(json["fields"][0]["derivedFormula"], "1 + 1");
    }
}
