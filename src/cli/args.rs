//! CLI argument definitions using clap
//!
//! Commands:
//! - formwright init --config <path>
//! - formwright forms --config <path>
//! - formwright check
//! - formwright save --config <path>
//! - formwright submit --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formwright - build, validate and fill in typed forms
#[derive(Parser, Debug)]
#[command(name = "formwright")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the form store file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./formwright.json")]
        config: PathBuf,
    },

    /// List stored forms
    Forms {
        /// Path to configuration file
        #[arg(long, default_value = "./formwright.json")]
        config: PathBuf,
    },

    /// Structurally validate a field list read from stdin
    Check,

    /// Validate a field list read from stdin and store it as a new form
    Save {
        /// Path to configuration file
        #[arg(long, default_value = "./formwright.json")]
        config: PathBuf,
    },

    /// Validate values read from stdin against the stored form
    Submit {
        /// Path to configuration file
        #[arg(long, default_value = "./formwright.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
