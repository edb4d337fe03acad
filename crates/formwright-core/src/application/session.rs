//! Form session
//!
//! Owns one definition with its entered values and current errors. Every
//! value change re-validates the edited field, recomputes all derived fields
//! and queues the events the rendering layer listens to.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::aggregates::FormDefinition;
use crate::domain::events::FormEvent;
use crate::domain::services::{DerivedFieldEvaluator, ValidationEngine};
use crate::domain::value_objects::{FieldValue, FormErrors, FormValues};
use crate::error::{FormsError, Result};
use crate::ports::outbound::FormRepository;

/// What the rendering layer draws from
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub form_id: String,
    pub values: FormValues,
    pub errors: FormErrors,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResult {
    Accepted { values: FormValues },
    Rejected { errors: FormErrors },
}

impl SubmitResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResult::Accepted { .. })
    }
}

pub struct FormSession {
    repo: Arc<dyn FormRepository>,
    definition: FormDefinition,
    values: FormValues,
    errors: FormErrors,
    events: Vec<FormEvent>,
}

impl FormSession {
    pub fn new(repo: Arc<dyn FormRepository>, definition: FormDefinition) -> Self {
        let mut session = Self {
            repo,
            definition: FormDefinition::create(""),
            values: FormValues::new(),
            errors: FormErrors::new(),
            events: vec![],
        };
        session.load_definition(definition);
        session
    }

    pub fn definition(&self) -> &FormDefinition { &self.definition }
    pub fn values(&self) -> &FormValues { &self.values }
    pub fn errors(&self) -> &FormErrors { &self.errors }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Current message for a field, empty when it has none.
    pub fn error(&self, field_id: &str) -> &str {
        self.errors.get(field_id).map(String::as_str).unwrap_or("")
    }

    /// Fetch a saved definition and load it.
    pub async fn open(&mut self, form_id: &str) -> Result<()> {
        let definition = self
            .repo
            .get_by_id(form_id)
            .await?
            .ok_or_else(|| FormsError::FormNotFound(form_id.to_string()))?;
        tracing::info!(form_id = %form_id, name = %definition.name(), "Opened form for preview");
        self.load_definition(definition);
        Ok(())
    }

    /// Saved definitions available to open.
    pub async fn saved_forms(&self) -> Result<Vec<FormDefinition>> {
        Ok(self.repo.list().await?)
    }

    /// Replace the definition and start from empty values.
    pub fn load_definition(&mut self, definition: FormDefinition) {
        for cycle in DerivedFieldEvaluator::find_cycles(definition.fields()) {
            tracing::warn!(
                form_id = %definition.id(),
                fields = ?cycle,
                "Derived fields reference each other; values will follow the previous pass"
            );
        }
        self.definition = definition;
        self.events.push(FormEvent::DefinitionChanged {
            form_id: self.definition.id().to_string(),
        });
        self.reset();
    }

    /// Back to empty values and no errors, same definition.
    pub fn reset(&mut self) {
        self.values = self
            .definition
            .fields()
            .iter()
            .map(|f| (f.id.clone(), f.field_type.empty_value()))
            .collect();
        self.errors.clear();
        DerivedFieldEvaluator::recompute(self.definition.fields(), &mut self.values);

        let all: Vec<String> = self.definition.fields().iter().map(|f| f.id.clone()).collect();
        self.events.push(FormEvent::ValuesChanged {
            form_id: self.definition.id().to_string(),
            field_ids: all.clone(),
        });
        self.events.push(FormEvent::ErrorsChanged {
            form_id: self.definition.id().to_string(),
            field_ids: all,
        });
    }

    /// Record an edit, validate that field, then recompute derived fields.
    pub fn set_value(&mut self, field_id: &str, value: impl Into<FieldValue>) -> Result<FormSnapshot> {
        let field = self
            .definition
            .field(field_id)
            .ok_or_else(|| FormsError::FieldNotFound(field_id.to_string()))?;
        let value = value.into();

        let message = ValidationEngine::validate_field(field, &value);
        self.values.insert(field_id.to_string(), value);

        if self.error(field_id) != message {
            if message.is_empty() {
                self.errors.remove(field_id);
            } else {
                self.errors.insert(field_id.to_string(), message);
            }
            self.events.push(FormEvent::ErrorsChanged {
                form_id: self.definition.id().to_string(),
                field_ids: vec![field_id.to_string()],
            });
        }

        let report = DerivedFieldEvaluator::recompute(self.definition.fields(), &mut self.values);
        let mut changed = vec![field_id.to_string()];
        changed.extend(report.updated.into_iter().filter(|id| id != field_id));
        self.events.push(FormEvent::ValuesChanged {
            form_id: self.definition.id().to_string(),
            field_ids: changed,
        });

        Ok(self.snapshot())
    }

    /// Validate every field; values are only handed out when all pass.
    pub fn submit(&mut self) -> SubmitResult {
        let errors = ValidationEngine::validate_form(self.definition.fields(), &self.values);
        let form_id = self.definition.id().to_string();

        let mut touched: Vec<String> = self.errors.keys().chain(errors.keys()).cloned().collect();
        touched.sort();
        touched.dedup();
        self.errors = errors.clone();
        if !touched.is_empty() {
            self.events.push(FormEvent::ErrorsChanged { form_id: form_id.clone(), field_ids: touched });
        }

        let result = if ValidationEngine::has_errors(&errors) {
            tracing::debug!(form_id = %form_id, failed = errors.len(), "Submit rejected");
            SubmitResult::Rejected { errors }
        } else {
            SubmitResult::Accepted { values: self.values.clone() }
        };
        self.events.push(FormEvent::Submitted { form_id, accepted: result.is_accepted() });
        result
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            form_id: self.definition.id().to_string(),
            values: self.values.clone(),
            errors: self.errors.clone(),
        }
    }

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }
}
