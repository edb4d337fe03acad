//! Outbound ports (Repository traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::FormDefinition;

/// Saved form definitions port
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Store a copy of the definition, replacing one with the same id
    async fn save(&self, definition: &FormDefinition) -> Result<(), RepositoryError>;

    /// All saved definitions in save order
    async fn list(&self) -> Result<Vec<FormDefinition>, RepositoryError>;

    /// Remove a definition; absent ids are ignored
    async fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError>;

    /// Find definition by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<FormDefinition>, RepositoryError>;

    /// Overwrite the auto-saved draft slot
    async fn write_auto_save(&self, definition: &FormDefinition) -> Result<(), RepositoryError>;

    /// The last auto-saved draft, if any
    async fn load_auto_saved(&self) -> Result<Option<FormDefinition>, RepositoryError>;

    /// Best-effort draft save. Drafts without fields are skipped and
    /// failures are logged, never returned.
    async fn auto_save(&self, definition: &FormDefinition) {
        if definition.fields().is_empty() {
            tracing::trace!(form_id = %definition.id(), "Skipping auto-save of empty form");
            return;
        }
        match self.write_auto_save(definition).await {
            Ok(()) => tracing::debug!(form_id = %definition.id(), "Auto-saved form draft"),
            Err(e) => tracing::warn!(form_id = %definition.id(), error = %e, "Auto-save failed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}
