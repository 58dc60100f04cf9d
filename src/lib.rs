//! formwright - a form builder and renderer engine
//!
//! Forms are lists of typed fields carrying select options and validation
//! rules. The builder edits a form and persists every accepted field change
//! through a debounced autosave; the renderer loads the stored form and
//! validates user input on every change.

pub mod builder;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod observability;
pub mod renderer;
pub mod schema;
pub mod storage;
