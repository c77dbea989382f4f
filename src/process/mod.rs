// src/process/mod.rs

//! Process execution layer.
//!
//! - [`outcome`] holds the `Invocation` description and the three-way
//!   `ProcessOutcome`.
//! - [`supervisor`] owns `ProcessSupervisor`, the production `ProcessRunner`
//!   that spawns a child via `tokio::process::Command` and streams its output
//!   into an `ExecutionLogger`.
//!
//! Callers depend on the [`ProcessRunner`] trait so tests can substitute a
//! scripted runner that never spawns anything.

pub mod outcome;
pub mod supervisor;

pub use outcome::{Invocation, ProcessOutcome};
pub use supervisor::ProcessSupervisor;

use crate::errors::{ExecError, Result};
use crate::log::{ExecutionLogger, LogFields};
use crate::types::BoxFuture;

/// Runs one external process to completion.
///
/// Implementations must resolve to exactly one [`ProcessOutcome`] per call
/// and must have written all captured output to `logger` before resolving.
pub trait ProcessRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        logger: &'a ExecutionLogger,
    ) -> BoxFuture<'a, ProcessOutcome>;
}

/// Turn a failed outcome into a step-specific log line plus
/// [`ExecError::CommandExecutionFailed`].
///
/// `action` completes the sentence "Failed to ...", e.g. `"extract asset"`
/// yields `Failed to extract asset, exit code 1.`.
pub async fn require_success(
    outcome: ProcessOutcome,
    invocation: &Invocation,
    logger: &ExecutionLogger,
    action: &str,
) -> Result<()> {
    let (message, fields) = match &outcome {
        ProcessOutcome::Success => return Ok(()),
        ProcessOutcome::NonZeroExit { code } => (
            format!("Failed to {action}, exit code {code}."),
            LogFields::from([("exit_code".to_string(), code.to_string())]),
        ),
        ProcessOutcome::LaunchFailed { error } => {
            (format!("Failed to {action}, error {error}."), LogFields::new())
        }
    };
    logger.error(message, fields).await?;

    Err(ExecError::CommandExecutionFailed {
        program: invocation.program.clone(),
        reason: outcome.to_string(),
    })
}
