//! Aggregates module

pub mod field;
pub mod form;

pub use field::{FieldUpdate, FormField};
pub use form::FormDefinition;
