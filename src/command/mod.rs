// src/command/mod.rs

//! Commands and the two executors that run them.
//!
//! - [`executor`]: `CommandExecutor` runs a [`Command`] with a logger it is
//!   handed and returns its output. It knows nothing about how logs are
//!   created or finalized.
//! - [`context`]: `ContextAwareCommandExecutor` creates the execution log for
//!   a [`ContextAwareCommand`], delegates, classifies failures and finalizes
//!   the log.

pub mod context;
pub mod executor;

use std::path::PathBuf;
use std::time::Duration;

use crate::job::Job;
use crate::process::Invocation;

pub use context::{ContextAwareCommand, ContextAwareCommandExecutor, JobCommand};
pub use executor::CommandExecutor;

/// An invokable unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Dispatch a build job through the job registry.
    RunJob(Job),
    /// Run one supervised process; non-zero exit fails the command.
    Spawn(Invocation),
    /// Create a directory and its parents. Existing directories are fine.
    CreateDirectory(PathBuf),
}

/// What a successfully executed [`Command`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// A job ran to completion.
    Completed,
    /// A supervised process exited with code 0.
    ProcessExited { program: PathBuf, elapsed: Duration },
    /// The directory exists.
    DirectoryCreated(PathBuf),
}
