//! CLI command definitions for config-packager
//!
//! This module defines the CLI structure using clap's derive macros.
//! Flags that mirror configuration fields are collected by
//! [`Cli::overrides`] into the highest configuration tier.

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::PathBuf;

/// Layered configuration compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project directory (default: current directory)
    #[arg(short, long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Configuration file used instead of packager.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Build directory (overrides config)
    #[arg(short, long, global = true)]
    pub build_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Flatten the local constants into constants.properties
    GenerateFilters,

    /// Resolve dependencies, merge, substitute and export (default)
    Compile {
        /// Deploy to this local server afterwards
        #[arg(long)]
        server_id: Option<String>,
    },

    /// Export the compiled constants as JSON
    ExportConstants,

    /// Copy the compiled configuration into a local server
    Deploy {
        #[arg(long)]
        server_id: Option<String>,
    },

    /// Write the content package descriptor and tree
    ContentPackage {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        version: Option<String>,
    },

    /// Generate a Rust module of constants
    GenerateConstants {
        /// Module file stem
        #[arg(long)]
        module: Option<String>,
    },

    /// Rebuild whenever the project or its dependencies change
    Watch {
        /// Quiet period before rebuilding, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Command to run on each rebuild
        #[arg(long)]
        command: Option<String>,
    },
}

impl Command {
    /// Command-table name of this subcommand.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GenerateFilters => "generate-filters",
            Command::Compile { .. } => "compile",
            Command::ExportConstants => "export-constants",
            Command::Deploy { .. } => "deploy",
            Command::ContentPackage { .. } => "content-package",
            Command::GenerateConstants { .. } => "generate-constants",
            Command::Watch { .. } => "watch",
        }
    }
}

impl Cli {
    /// The subcommand to run, `compile` when none was given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Compile { server_id: None })
    }

    /// Configuration overrides from flags. Unset flags are null and leave
    /// lower tiers alone.
    pub fn overrides(&self) -> Value {
        let mut overrides = json!({
            "paths": { "build_dir": self.build_dir },
        });
        let section = match self.command() {
            Command::Compile { server_id } | Command::Deploy { server_id } => {
                json!({ "deploy": { "server_id": server_id } })
            }
            Command::ContentPackage { name, version } => {
                json!({ "package": { "name": name, "version": version } })
            }
            Command::GenerateConstants { module } => {
                json!({ "generate": { "module_name": module } })
            }
            Command::Watch {
                debounce_ms,
                command,
            } => json!({ "watch": { "debounce_ms": debounce_ms, "command": command } }),
            Command::GenerateFilters | Command::ExportConstants => Value::Null,
        };
        crate::config::overlay_in_place(&mut overrides, section);
        overrides
    }
}
