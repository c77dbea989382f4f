// src/errors.rs

//! Crate-wide error types.
//!
//! [`ExecError`] is what commands and jobs fail with. The
//! [`ExecError::CommandExecutionFailed`] kind is reserved for external
//! processes that exited non-zero or could not be launched; the step-specific
//! diagnostic for those has already been written to the execution log by the
//! time the error is raised.

use std::path::PathBuf;

use thiserror::Error;

use crate::log::LogError;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Command execution failed: {program}: {reason}")]
    CommandExecutionFailed { program: PathBuf, reason: String },

    #[error("Asset '{0}' not found")]
    AssetNotFound(String),

    #[error("Failed to extract archive {archive:?}: {message}")]
    Archive { archive: PathBuf, message: String },

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecError {
    /// Name of the failure kind as written to an execution log.
    ///
    /// Opaque failures (`Other`) have no kind.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            ExecError::CommandExecutionFailed { .. } => Some("CommandExecutionFailed"),
            ExecError::AssetNotFound(_) => Some("AssetNotFound"),
            ExecError::Archive { .. } => Some("ArchiveError"),
            ExecError::Filesystem(_) => Some("FilesystemError"),
            ExecError::InvalidJob(_) => Some("InvalidJob"),
            ExecError::ConfigError(_) => Some("ConfigError"),
            ExecError::IoError(_) => Some("IoError"),
            ExecError::TomlError(_) => Some("TomlError"),
            ExecError::Log(_) => Some("LogError"),
            ExecError::Other(_) => None,
        }
    }

    /// Wrap a failure from the `FileSystem` seam, keeping its context chain.
    pub fn filesystem(err: anyhow::Error) -> Self {
        ExecError::Filesystem(format!("{err:#}"))
    }

    pub fn is_command_execution_failure(&self) -> bool {
        matches!(self, ExecError::CommandExecutionFailed { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExecError>;
