//! CLI module for formwright
//!
//! Provides command-line interface for:
//! - init: Create the form store
//! - forms: List stored forms
//! - check: Structural validation of a field list
//! - save: Validate and store a field list
//! - submit: Runtime validation of submitted values

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, forms, init, run, run_command, save, submit};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
