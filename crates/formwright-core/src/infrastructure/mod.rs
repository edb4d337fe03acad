//! Infrastructure layer
//!
//! Concrete adapters for the ports.

pub mod persistence;

pub use persistence::{InMemoryFormRepository, JsonFileFormRepository};
