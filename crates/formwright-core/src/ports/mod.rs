//! Ports module (Hexagonal Architecture)
//!
//! Defines interfaces for external dependencies.

pub mod outbound;

pub use outbound::*;
