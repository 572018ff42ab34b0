//! CLI command definitions for konfig
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::error::{KonfigError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Provider mode for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModeArg {
    /// Explicit YAML files (default: <environment>.yml)
    #[default]
    Yaml,
    /// Every YAML file in the working directory, in file-name order
    Directory,
}

/// Output format for `dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DumpFormat {
    #[default]
    Json,
    Yaml,
}

/// Resolve layered YAML configuration and inspect the result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the config files
    #[arg(short, long, global = true, default_value = ".")]
    pub workdir: PathBuf,

    /// How source files are selected
    #[arg(short, long, value_enum, global = true, default_value_t = ModeArg::Yaml)]
    pub mode: ModeArg,

    /// Config file to load, relative to the workdir (repeatable; later files win)
    #[arg(short, long = "file", global = true)]
    pub files: Vec<String>,

    /// Environment variable prefix for overrides (default: KONFIG)
    #[arg(short, long, global = true)]
    pub prefix: Option<String>,

    /// Parse files as-is, without expanding <%= %> tags
    #[arg(long, global = true)]
    pub no_templates: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Reject flag combinations that would otherwise be silently ignored.
    pub fn validate(&self) -> Result<()> {
        if self.mode == ModeArg::Directory && !self.files.is_empty() {
            return Err(KonfigError::invalid_argument(
                "--file cannot be combined with --mode directory",
            ));
        }
        Ok(())
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at a dotted path as JSON
    Get {
        /// Dotted settings path, e.g. database.pool.size
        path: String,
    },

    /// Print the whole resolved configuration
    Dump {
        #[arg(long, value_enum, default_value_t = DumpFormat::Json)]
        format: DumpFormat,
    },

    /// List every leaf with the environment variable that overrides it
    Env,

    /// Print the override variable name for a dotted path
    EnvName {
        /// Dotted settings path
        path: String,
    },

    /// Show which files and overrides contributed to the result
    Sources,
}
