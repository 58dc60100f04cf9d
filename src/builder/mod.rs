//! Form builder
//!
//! State transitions for assembling a form: add, edit and delete fields,
//! options and validation rules; autosave edits; validate and save.

mod controller;
mod edits;
mod errors;

pub use controller::{BuilderController, SaveOutcome};
pub use edits::{FieldEdit, RuleEdit};
pub use errors::{BuilderError, BuilderResult};
