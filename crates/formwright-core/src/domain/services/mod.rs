//! Domain services
//!
//! Stateless engines operating on fields and value maps.

pub mod derived;
pub mod formula;
pub mod validation;

pub use derived::{DerivedFieldEvaluator, RecomputeReport};
pub use formula::FormulaError;
pub use validation::ValidationEngine;
