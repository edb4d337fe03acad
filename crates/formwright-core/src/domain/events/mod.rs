//! Form events
//!
//! Notifications the rendering layer consumes after each operation.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    DefinitionChanged { form_id: String },
    ValuesChanged { form_id: String, field_ids: Vec<String> },
    ErrorsChanged { form_id: String, field_ids: Vec<String> },
    Submitted { form_id: String, accepted: bool },
}

impl FormEvent {
    pub fn form_id(&self) -> &str {
        match self {
            FormEvent::DefinitionChanged { form_id }
            | FormEvent::ValuesChanged { form_id, .. }
            | FormEvent::ErrorsChanged { form_id, .. }
            | FormEvent::Submitted { form_id, .. } => form_id,
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            FormEvent::DefinitionChanged { .. } => "form.definition_changed",
            FormEvent::ValuesChanged { .. } => "form.values_changed",
            FormEvent::ErrorsChanged { .. } => "form.errors_changed",
            FormEvent::Submitted { .. } => "form.submitted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = FormEvent::ValuesChanged {
            form_id: "f1".into(),
            field_ids: vec!["a".into(), "c".into()],
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "type": "values_changed", "form_id": "f1", "field_ids": ["a", "c"] })
        );
        assert_eq!(event.form_id(), "f1");
    }
}
