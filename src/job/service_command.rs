// src/job/service_command.rs

use crate::errors::{ExecError, Result};
use crate::job::container::ContainerCli;
use crate::job::{Job, JobExecutor};
use crate::log::ExecutionLogger;
use crate::types::{BoxFuture, Build};

/// Run a command inside an already running service container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteServiceCommandJob {
    pub build: Build,
    pub container_id: String,
    pub command: Vec<String>,
}

impl ExecuteServiceCommandJob {
    pub fn new<I, S>(build: Build, container_id: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            build,
            container_id: container_id.into(),
            command: command.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct ExecuteServiceCommandExecutor {
    container: ContainerCli,
}

impl ExecuteServiceCommandExecutor {
    pub fn new(container: ContainerCli) -> Self {
        Self { container }
    }

    async fn exec(&self, job: &ExecuteServiceCommandJob, logger: &ExecutionLogger) -> Result<()> {
        if job.command.is_empty() {
            return Err(ExecError::InvalidJob(format!(
                "no command given for container '{}'",
                job.container_id
            )));
        }

        logger
            .info(format!(
                "Executing '{}' in container '{}'.",
                job.command.join(" "),
                job.container_id
            ))
            .await?;

        let invocation = self
            .container
            .exec(&job.container_id, &job.command, job.build.path());
        self.container
            .run_step(&invocation, logger, "execute service command")
            .await
    }
}

impl JobExecutor for ExecuteServiceCommandExecutor {
    fn supports(&self, job: &Job) -> bool {
        matches!(job, Job::ExecuteServiceCommand(_))
    }

    fn execute<'a>(&'a self, job: &'a Job, logger: &'a ExecutionLogger) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Job::ExecuteServiceCommand(job) = job else {
                unreachable!("service-command executor received a {} job", job.kind());
            };
            self.exec(job, logger).await
        })
    }
}
