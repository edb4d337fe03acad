//! Formwright Form Builder Engine
//!
//! Field model, validation rules and derived (computed) fields for
//! hand-built data-entry forms.
//!
//! ## Architecture
//!
//! - **Domain Layer**: field model, validation engine, formula engine, derived-field evaluator
//! - **Application Layer**: form session (preview), form builder (editing), auto-saver
//! - **Ports Layer**: form repository interface
//! - **Infrastructure Layer**: in-memory and JSON file repositories
//!
//! ## Flow
//!
//! An edit reaches [`FormSession::set_value`], which re-validates the edited
//! field, recomputes every derived field and queues [`FormEvent`]s for the
//! rendering layer.

pub mod domain;
pub mod application;
pub mod ports;
pub mod infrastructure;
pub mod error;

// Re-exports for convenience
pub use domain::aggregates::{FieldUpdate, FormDefinition, FormField};
pub use domain::value_objects::{
    FieldType, FieldValue, FormErrors, FormValues, RuleFieldChange, ValidationKind, ValidationRule,
};
pub use domain::events::FormEvent;
pub use domain::services::{DerivedFieldEvaluator, FormulaError, RecomputeReport, ValidationEngine};
pub use application::{AutoSaver, FormBuilder, FormSession, FormSnapshot, SubmitResult, DEFAULT_AUTO_SAVE_INTERVAL};
pub use ports::outbound::{FormRepository, RepositoryError};
pub use infrastructure::{InMemoryFormRepository, JsonFileFormRepository};
pub use error::{FormsError, Result};
