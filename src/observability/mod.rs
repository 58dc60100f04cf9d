//! Observability for formwright
//!
//! Structured one-line JSON logging with explicit severities.
//!
//! ```ignore
//! use formwright::observability::Logger;
//!
//! Logger::info("FORM_SAVED", &[("form_id", "482913"), ("fields", "3")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
