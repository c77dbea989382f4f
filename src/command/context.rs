// src/command/context.rs

//! Binds an execution log around every command run.
//!
//! Per call to [`ContextAwareCommandExecutor::execute`]:
//!
//! 1. create a `pending` log from the command's [`LogContext`] and wrap it in
//!    an [`ExecutionLogger`];
//! 2. mark it `running` and hand the wrapped [`Command`] plus logger to the
//!    [`CommandExecutor`];
//! 3. on success, run the optional result post-processor, mark `completed`
//!    and append `Command completed.`;
//! 4. on failure, mark `failed`, append the classified failure lines and
//!    return the original error.
//!
//! Every log write is awaited before `execute` returns.

use std::sync::Arc;

use tracing::{error, info};

use crate::command::executor::CommandExecutor;
use crate::command::{Command, CommandOutput};
use crate::errors::{ExecError, Result};
use crate::job::Job;
use crate::log::{CommandLogRepository, ExecutionLogger, LogContext, LogFields};
use crate::types::BoxFuture;

pub const COMMAND_COMPLETED: &str = "Command completed.";
pub const COMMAND_FAILED: &str = "Command execution failed.";

/// A command that knows which log it should be recorded under.
pub trait ContextAwareCommand: Send + Sync {
    fn log_context(&self) -> LogContext;

    /// The concrete command to run.
    fn wrapped_command(&self) -> Command;

    /// Optional post-processing of a successful result. Returning `None`
    /// means there is nothing to do. A failure here fails the whole command.
    fn process_result<'a>(&'a self, _output: &'a CommandOutput) -> Option<BoxFuture<'a, Result<()>>> {
        None
    }
}

/// Runs a single [`Job`] under its own execution log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommand {
    job: Job,
}

impl JobCommand {
    pub fn new(job: impl Into<Job>) -> Self {
        Self { job: job.into() }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }
}

impl ContextAwareCommand for JobCommand {
    fn log_context(&self) -> LogContext {
        LogContext::new(self.job.build().id.clone(), self.job.describe())
    }

    fn wrapped_command(&self) -> Command {
        Command::RunJob(self.job.clone())
    }
}

pub struct ContextAwareCommandExecutor {
    repository: Arc<dyn CommandLogRepository>,
    executor: CommandExecutor,
}

impl ContextAwareCommandExecutor {
    pub fn new(repository: Arc<dyn CommandLogRepository>, executor: CommandExecutor) -> Self {
        Self {
            repository,
            executor,
        }
    }

    pub async fn execute<C>(&self, command: &C) -> Result<CommandOutput>
    where
        C: ContextAwareCommand + ?Sized,
    {
        let logger = self.create_logger(command).await?;
        let wrapped = command.wrapped_command();

        let result = match self.run(command, wrapped, &logger).await {
            Ok(output) => self.record_success(&logger).await.map(|()| output),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            self.record_failure(&logger, err).await;
        }
        result
    }

    /// Finalize as completed and append `Command completed.`.
    ///
    /// A record that cannot be marked completed fails the command, so it ends
    /// up `failed` instead of stuck in `running`. Once the status is stored,
    /// a lost closing line is only reported through `tracing`.
    async fn record_success(&self, logger: &ExecutionLogger) -> Result<()> {
        logger.mark_as_completed().await?;

        if let Err(log_err) = logger.info(COMMAND_COMPLETED).await {
            error!(log_id = %logger.log_id(), error = %log_err, "failed to write completion line");
        }
        info!(log_id = %logger.log_id(), "command completed");
        Ok(())
    }

    async fn create_logger<C>(&self, command: &C) -> Result<ExecutionLogger>
    where
        C: ContextAwareCommand + ?Sized,
    {
        let log = self.repository.create(&command.log_context()).await?;
        info!(log_id = %log.id, build = %log.build_id, description = %log.description, "created execution log");
        Ok(ExecutionLogger::new(&log, Arc::clone(&self.repository)))
    }

    async fn run<C>(&self, command: &C, wrapped: Command, logger: &ExecutionLogger) -> Result<CommandOutput>
    where
        C: ContextAwareCommand + ?Sized,
    {
        logger.mark_as_running().await?;
        let output = self.executor.execute(wrapped, logger).await?;
        if let Some(post_process) = command.process_result(&output) {
            post_process.await?;
        }
        Ok(output)
    }

    /// Finalize as failed and write the classified lines. Problems writing
    /// the log are reported through `tracing` only, so the caller always gets
    /// the original error back.
    async fn record_failure(&self, logger: &ExecutionLogger, err: &ExecError) {
        if let Err(log_err) = logger.mark_as_failed().await {
            error!(log_id = %logger.log_id(), error = %log_err, "failed to mark execution log as failed");
        }

        for message in failure_messages(err) {
            if let Err(log_err) = logger.error(message, LogFields::new()).await {
                error!(log_id = %logger.log_id(), error = %log_err, "failed to write failure line");
            }
        }

        error!(log_id = %logger.log_id(), error = %err, "command failed");
    }
}

/// Lines written to the execution log for a failed command.
///
/// Process failures already logged their own diagnostic, so they only get
/// the generic line. Other typed failures also get their kind and message.
/// Opaque failures get the generic line only.
pub fn failure_messages(err: &ExecError) -> Vec<String> {
    if err.is_command_execution_failure() {
        return vec![COMMAND_FAILED.to_string()];
    }
    match err.kind() {
        Some(kind) => vec![
            COMMAND_FAILED.to_string(),
            format!("Error class: {kind}"),
            format!("Error message '{err}'."),
        ],
        None => vec![COMMAND_FAILED.to_string()],
    }
}
