//! Error types for Formwright

use thiserror::Error;

use crate::domain::value_objects::ValidationKind;
use crate::ports::outbound::RepositoryError;

#[derive(Error, Debug)]
pub enum FormsError {
    #[error("form not found: {0}")]
    FormNotFound(String),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// A field already carries a rule of this kind
    #[error("field {field_id} already has a {kind} rule")]
    DuplicateRule {
        field_id: String,
        kind: ValidationKind,
    },

    #[error("field {field_id} has no validation rule at index {index}")]
    ValidationRuleNotFound { field_id: String, index: usize },

    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

pub type Result<T> = std::result::Result<T, FormsError>;
