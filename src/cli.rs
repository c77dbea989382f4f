// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::config::default_config_path;

/// Command-line arguments for `feater`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "feater",
    version,
    about = "Provision preview-environment resources through the container CLI.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path(), global = true)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FEATER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Build context shared by job subcommands.
#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Identifier of the build the job belongs to.
    #[arg(long, value_name = "ID")]
    pub build_id: String,

    /// Absolute working directory of the build.
    #[arg(long, value_name = "PATH")]
    pub build_path: PathBuf,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Create a named volume and fill it from an uploaded asset archive.
    CreateVolume {
        #[command(flatten)]
        build: BuildArgs,

        #[arg(long, value_name = "ID")]
        asset_id: String,

        #[arg(long, value_name = "NAME")]
        volume_name: String,
    },

    /// Run a command inside a running service container.
    Exec {
        #[command(flatten)]
        build: BuildArgs,

        #[arg(long, value_name = "ID")]
        container: String,

        /// Command and arguments, after `--`.
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Print a persisted execution log as JSON.
    ShowLog {
        log_id: Uuid,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
