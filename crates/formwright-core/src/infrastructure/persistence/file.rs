//! JSON file repository
//!
//! Keeps saved forms in `saved_forms.json` and the draft in `autosave.json`
//! under one directory. Missing files read as empty. Writes go through a
//! temporary file and a rename so a crash never leaves half a document.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::domain::aggregates::FormDefinition;
use crate::ports::outbound::{FormRepository, RepositoryError};

use super::upsert;

const SAVED_FORMS_FILE: &str = "saved_forms.json";
const AUTOSAVE_FILE: &str = "autosave.json";

pub struct JsonFileFormRepository {
    dir: PathBuf,
    // serializes every write; temp file names are fixed per target
    write_lock: Mutex<()>,
}

impl JsonFileFormRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), write_lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_forms(&self) -> Result<Vec<FormDefinition>, RepositoryError> {
        Ok(read_json(&self.dir.join(SAVED_FORMS_FILE)).await?.unwrap_or_default())
    }

    async fn write_forms(&self, forms: &[FormDefinition]) -> Result<(), RepositoryError> {
        write_json(&self.dir, SAVED_FORMS_FILE, &forms).await
    }
}

#[async_trait]
impl FormRepository for JsonFileFormRepository {
    async fn save(&self, definition: &FormDefinition) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut forms = self.read_forms().await?;
        upsert(&mut forms, definition);
        self.write_forms(&forms).await?;
        tracing::info!(form_id = %definition.id(), name = %definition.name(), "Saved form");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<FormDefinition>, RepositoryError> {
        self.read_forms().await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut forms = self.read_forms().await?;
        let before = forms.len();
        forms.retain(|f| f.id() != id);
        if forms.len() != before {
            self.write_forms(&forms).await?;
            tracing::info!(form_id = %id, "Deleted form");
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FormDefinition>, RepositoryError> {
        Ok(self.read_forms().await?.into_iter().find(|f| f.id() == id))
    }

    async fn write_auto_save(&self, definition: &FormDefinition) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.dir, AUTOSAVE_FILE, definition).await
    }

    async fn load_auto_saved(&self) -> Result<Option<FormDefinition>, RepositoryError> {
        read_json(&self.dir.join(AUTOSAVE_FILE)).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, RepositoryError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: serde::Serialize + ?Sized>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<(), RepositoryError> {
    tokio::fs::create_dir_all(dir).await?;
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = dir.join(format!("{}.tmp", file_name));
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, dir.join(file_name)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::FormField;
    use crate::domain::value_objects::{FieldType, ValidationRule};

    fn sample_form() -> FormDefinition {
        let mut form = FormDefinition::create("Survey");
        form.push_field(FormField::new(FieldType::Text, "Name").with_rule(ValidationRule::min_length(2)));
        form.push_field(FormField::new(FieldType::Checkbox, "Topics"));
        form.push_field(FormField::derived("Score", "Name + 1"));
        form
    }

    #[tokio::test]
    async fn test_empty_directory_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileFormRepository::new(dir.path().join("store"));

        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.load_auto_saved().await.unwrap().is_none());
        repo.delete_by_id("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let form = sample_form();

        JsonFileFormRepository::new(dir.path()).save(&form).await.unwrap();

        // A fresh instance sees what the first one wrote
        let repo = JsonFileFormRepository::new(dir.path());
        assert_eq!(repo.get_by_id(form.id()).await.unwrap(), Some(form.clone()));
        assert_eq!(repo.list().await.unwrap(), vec![form.clone()]);

        repo.delete_by_id(form.id()).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auto_save_slot() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileFormRepository::new(dir.path());
        let form = sample_form();

        repo.auto_save(&form).await;
        assert_eq!(repo.load_auto_saved().await.unwrap(), Some(form));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_auto_saves() {
        let dir = tempfile::tempdir().unwrap();
        let repo = std::sync::Arc::new(JsonFileFormRepository::new(dir.path()));

        let mut drafts = Vec::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let mut form = sample_form();
            form.rename(format!("Draft {}", i));
            drafts.push(form.clone());
            let repo = repo.clone();
            handles.push(tokio::spawn(async move { repo.write_auto_save(&form).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let saved = repo.load_auto_saved().await.unwrap().unwrap();
        assert!(drafts.contains(&saved));
        assert!(!dir.path().join(format!("{}.tmp", AUTOSAVE_FILE)).exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SAVED_FORMS_FILE), b"not json").unwrap();
        let repo = JsonFileFormRepository::new(dir.path());

        assert!(matches!(repo.list().await, Err(RepositoryError::Serialization(_))));
    }
}
