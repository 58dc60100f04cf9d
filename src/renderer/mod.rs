//! Form renderer
//!
//! Loads the stored form, keeps the entered values and recomputes every
//! field's runtime error whenever any value changes.

mod controller;
mod errors;

pub use controller::{RendererController, SubmitOutcome};
pub use errors::{RendererError, RendererResult};
