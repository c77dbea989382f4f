// src/command/executor.rs

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::command::{Command, CommandOutput};
use crate::errors::{ExecError, Result};
use crate::fs::FileSystem;
use crate::job::JobRegistry;
use crate::log::ExecutionLogger;
use crate::process::{require_success, ProcessRunner};

/// Runs commands to completion.
///
/// Process failures surface as `ExecError::CommandExecutionFailed`; every
/// other error is returned as the command produced it.
pub struct CommandExecutor {
    jobs: JobRegistry,
    runner: Arc<dyn ProcessRunner>,
    fs: Arc<dyn FileSystem>,
}

impl CommandExecutor {
    pub fn new(jobs: JobRegistry, runner: Arc<dyn ProcessRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self { jobs, runner, fs }
    }

    pub async fn execute(&self, command: Command, logger: &ExecutionLogger) -> Result<CommandOutput> {
        match command {
            Command::RunJob(job) => {
                self.jobs.execute(&job, logger).await?;
                Ok(CommandOutput::Completed)
            }
            Command::Spawn(invocation) => {
                let started = Instant::now();
                let outcome = self.runner.run(&invocation, logger).await;
                let action = format!("run '{}'", invocation.program.display());
                require_success(outcome, &invocation, logger, &action).await?;
                Ok(CommandOutput::ProcessExited {
                    program: invocation.program,
                    elapsed: started.elapsed(),
                })
            }
            Command::CreateDirectory(path) => {
                debug!(log_id = %logger.log_id(), path = ?path, "creating directory");
                self.fs.create_dir_all(&path).map_err(ExecError::filesystem)?;
                Ok(CommandOutput::DirectoryCreated(path))
            }
        }
    }
}
