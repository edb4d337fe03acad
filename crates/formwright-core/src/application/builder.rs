//! Form builder
//!
//! Editing side of a form: holds the draft definition, applies field edits
//! and saves through the repository. Every change is published on a watch
//! channel so the auto-saver always sees the latest draft.

use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::aggregates::{FieldUpdate, FormDefinition, FormField};
use crate::domain::events::FormEvent;
use crate::domain::value_objects::FieldType;
use crate::error::{FormsError, Result};
use crate::ports::outbound::FormRepository;

pub struct FormBuilder {
    repo: Arc<dyn FormRepository>,
    draft: FormDefinition,
    publisher: watch::Sender<FormDefinition>,
    events: Vec<FormEvent>,
}

impl FormBuilder {
    /// Start a new, empty form
    pub fn new(repo: Arc<dyn FormRepository>, name: impl Into<String>) -> Self {
        Self::from_definition(repo, FormDefinition::create(name))
    }

    /// Edit a copy of an existing definition
    pub fn from_definition(repo: Arc<dyn FormRepository>, draft: FormDefinition) -> Self {
        let (publisher, _) = watch::channel(draft.clone());
        Self { repo, draft, publisher, events: vec![] }
    }

    /// Edit a saved form
    pub async fn open(repo: Arc<dyn FormRepository>, form_id: &str) -> Result<Self> {
        let draft = repo
            .get_by_id(form_id)
            .await?
            .ok_or_else(|| FormsError::FormNotFound(form_id.to_string()))?;
        Ok(Self::from_definition(repo, draft))
    }

    /// Resume the last auto-saved draft, if there is one
    pub async fn restore(repo: Arc<dyn FormRepository>) -> Result<Option<Self>> {
        let draft = repo.load_auto_saved().await?;
        if let Some(ref d) = draft {
            tracing::info!(form_id = %d.id(), fields = d.fields().len(), "Restored auto-saved draft");
        }
        Ok(draft.map(|d| Self::from_definition(repo, d)))
    }

    pub fn draft(&self) -> &FormDefinition {
        &self.draft
    }

    /// Receiver that always holds the latest draft
    pub fn subscribe(&self) -> watch::Receiver<FormDefinition> {
        self.publisher.subscribe()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.draft.rename(name);
        self.changed();
    }

    pub fn add_field(&mut self, field_type: FieldType) -> String {
        let id = self.draft.add_field(field_type);
        self.changed();
        id
    }

    pub fn push_field(&mut self, field: FormField) -> String {
        let id = self.draft.push_field(field);
        self.changed();
        id
    }

    pub fn remove_field(&mut self, field_id: &str) -> Result<FormField> {
        let removed = self.draft.remove_field(field_id)?;
        self.changed();
        Ok(removed)
    }

    pub fn move_field(&mut self, field_id: &str, new_index: usize) -> Result<()> {
        self.draft.move_field(field_id, new_index)?;
        self.changed();
        Ok(())
    }

    /// Apply one typed field edit. Rejected edits change nothing and publish nothing.
    pub fn apply_update(&mut self, field_id: &str, update: FieldUpdate) -> Result<()> {
        if let Err(e) = self.draft.apply_update(field_id, update) {
            tracing::debug!(form_id = %self.draft.id(), field_id = %field_id, error = %e, "Field update rejected");
            return Err(e);
        }
        self.changed();
        Ok(())
    }

    /// Explicit save; storage failures are returned to the caller.
    pub async fn save(&self) -> Result<()> {
        self.repo.save(&self.draft).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<FormDefinition>> {
        Ok(self.repo.list().await?)
    }

    pub async fn delete(&self, form_id: &str) -> Result<()> {
        self.repo.delete_by_id(form_id).await?;
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    fn changed(&mut self) {
        self.publisher.send_replace(self.draft.clone());
        self.events.push(FormEvent::DefinitionChanged {
            form_id: self.draft.id().to_string(),
        });
    }
}
