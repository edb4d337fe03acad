//! Application layer
//!
//! Orchestrates editing, previewing and auto-saving of forms.

pub mod autosave;
pub mod builder;
pub mod session;

pub use autosave::{AutoSaver, DEFAULT_AUTO_SAVE_INTERVAL};
pub use builder::FormBuilder;
pub use session::{FormSession, FormSnapshot, SubmitResult};
