// src/log/mod.rs

//! Persisted execution logs.
//!
//! - [`model`] defines the log record (`CommandLog`) and its lines.
//! - [`repository`] is the persistence contract plus an in-memory store.
//! - [`file_store`] persists each log as a JSON document on disk.
//! - [`logger`] is the `ExecutionLogger` bound to one record for the duration
//!   of a single command execution.

pub mod file_store;
pub mod logger;
pub mod model;
pub mod repository;

use thiserror::Error;
use uuid::Uuid;

pub use file_store::FileCommandLogRepository;
pub use logger::ExecutionLogger;
pub use model::{CommandLog, LogContext, LogFields, LogLevel, LogLine, LogStatus};
pub use repository::{CommandLogRepository, InMemoryCommandLogRepository};

#[derive(Error, Debug)]
pub enum LogError {
    /// A terminal status was already recorded. Indicates a wiring defect in
    /// the caller, not an operational failure.
    #[error("execution log is already finalized as {status}")]
    AlreadyFinalized { status: LogStatus },

    #[error("invalid execution log transition from {from} to {to}")]
    InvalidTransition { from: LogStatus, to: LogStatus },

    #[error("execution log {0} not found")]
    NotFound(Uuid),

    #[error("execution log storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::Storage(err.to_string())
    }
}
