//! Form repository implementations

pub mod file;

pub use file::JsonFileFormRepository;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::aggregates::FormDefinition;
use crate::ports::outbound::{FormRepository, RepositoryError};

/// In-memory form repository (for testing and embedding)
#[derive(Default)]
pub struct InMemoryFormRepository {
    forms: RwLock<Vec<FormDefinition>>,
    draft: RwLock<Option<FormDefinition>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn save(&self, definition: &FormDefinition) -> Result<(), RepositoryError> {
        let mut forms = self.forms.write();
        upsert(&mut forms, definition);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<FormDefinition>, RepositoryError> {
        Ok(self.forms.read().clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError> {
        self.forms.write().retain(|f| f.id() != id);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FormDefinition>, RepositoryError> {
        Ok(self.forms.read().iter().find(|f| f.id() == id).cloned())
    }

    async fn write_auto_save(&self, definition: &FormDefinition) -> Result<(), RepositoryError> {
        *self.draft.write() = Some(definition.clone());
        Ok(())
    }

    async fn load_auto_saved(&self) -> Result<Option<FormDefinition>, RepositoryError> {
        Ok(self.draft.read().clone())
    }
}

/// Replace the definition with the same id in place, or append it.
pub(crate) fn upsert(forms: &mut Vec<FormDefinition>, definition: &FormDefinition) {
    match forms.iter_mut().find(|f| f.id() == definition.id()) {
        Some(existing) => *existing = definition.clone(),
        None => forms.push(definition.clone()),
    }
}

/// Test doubles shared by the application tests
#[cfg(test)]
pub(crate) mod fakes {
    use super::*;

    /// Repository whose every write fails
    pub struct BrokenRepository;

    #[async_trait]
    impl FormRepository for BrokenRepository {
        async fn save(&self, _definition: &FormDefinition) -> Result<(), RepositoryError> {
            Err(RepositoryError::Storage("quota exceeded".into()))
        }
        async fn list(&self) -> Result<Vec<FormDefinition>, RepositoryError> {
            Err(RepositoryError::Storage("quota exceeded".into()))
        }
        async fn delete_by_id(&self, _id: &str) -> Result<(), RepositoryError> {
            Err(RepositoryError::Storage("quota exceeded".into()))
        }
        async fn get_by_id(&self, _id: &str) -> Result<Option<FormDefinition>, RepositoryError> {
            Err(RepositoryError::Storage("quota exceeded".into()))
        }
        async fn write_auto_save(&self, _definition: &FormDefinition) -> Result<(), RepositoryError> {
            Err(RepositoryError::Storage("quota exceeded".into()))
        }
        async fn load_auto_saved(&self) -> Result<Option<FormDefinition>, RepositoryError> {
            Ok(None)
        }
    }
}
