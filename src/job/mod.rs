// src/job/mod.rs

//! Build jobs and their executors.
//!
//! [`Job`] is a closed set of variants. [`JobRegistry`] holds exactly one
//! [`JobExecutor`] per variant and dispatches with an exhaustive `match`, so
//! adding a variant without wiring an executor does not compile.

pub mod assets;
pub mod container;
pub mod create_volume;
pub mod service_command;

use std::fmt;

use tracing::info;

use crate::errors::Result;
use crate::log::ExecutionLogger;
use crate::types::{BoxFuture, Build};

pub use assets::{
    ArchiveExtractor, Asset, AssetPathResolver, AssetRepository, ConfiguredPathResolver,
    TarExtractor, UploadDirAssetRepository,
};
pub use container::ContainerCli;
pub use create_volume::{CreateVolumeFromAssetExecutor, CreateVolumeFromAssetJob};
pub use service_command::{ExecuteServiceCommandExecutor, ExecuteServiceCommandJob};

/// One unit of provisioning work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    CreateVolumeFromAsset(CreateVolumeFromAssetJob),
    ExecuteServiceCommand(ExecuteServiceCommandJob),
}

/// Variant tag of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    CreateVolumeFromAsset,
    ExecuteServiceCommand,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::CreateVolumeFromAsset => "create-volume-from-asset",
            JobKind::ExecuteServiceCommand => "execute-service-command",
        };
        f.write_str(s)
    }
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::CreateVolumeFromAsset(_) => JobKind::CreateVolumeFromAsset,
            Job::ExecuteServiceCommand(_) => JobKind::ExecuteServiceCommand,
        }
    }

    pub fn build(&self) -> &Build {
        match self {
            Job::CreateVolumeFromAsset(job) => &job.build,
            Job::ExecuteServiceCommand(job) => &job.build,
        }
    }

    /// Human-readable summary, used as the execution log description.
    pub fn describe(&self) -> String {
        match self {
            Job::CreateVolumeFromAsset(job) => format!(
                "Create volume '{}' from asset '{}'",
                job.volume_name, job.asset_id
            ),
            Job::ExecuteServiceCommand(job) => format!(
                "Execute '{}' in container '{}'",
                job.command.join(" "),
                job.container_id
            ),
        }
    }
}

impl From<CreateVolumeFromAssetJob> for Job {
    fn from(job: CreateVolumeFromAssetJob) -> Self {
        Job::CreateVolumeFromAsset(job)
    }
}

impl From<ExecuteServiceCommandJob> for Job {
    fn from(job: ExecuteServiceCommandJob) -> Self {
        Job::ExecuteServiceCommand(job)
    }
}

/// Realizes one job variant.
pub trait JobExecutor: Send + Sync {
    /// Whether this executor handles `job`'s variant.
    fn supports(&self, job: &Job) -> bool;

    fn execute<'a>(&'a self, job: &'a Job, logger: &'a ExecutionLogger) -> BoxFuture<'a, Result<()>>;
}

/// One executor per job variant.
pub struct JobRegistry {
    create_volume_from_asset: Box<dyn JobExecutor>,
    execute_service_command: Box<dyn JobExecutor>,
}

impl JobRegistry {
    pub fn new(
        create_volume_from_asset: Box<dyn JobExecutor>,
        execute_service_command: Box<dyn JobExecutor>,
    ) -> Self {
        Self {
            create_volume_from_asset,
            execute_service_command,
        }
    }

    pub fn executor_for(&self, job: &Job) -> &dyn JobExecutor {
        match job.kind() {
            JobKind::CreateVolumeFromAsset => self.create_volume_from_asset.as_ref(),
            JobKind::ExecuteServiceCommand => self.execute_service_command.as_ref(),
        }
    }

    /// Run `job` on its registered executor.
    ///
    /// # Panics
    ///
    /// If the executor wired for the job's variant does not support it. That
    /// is a wiring defect, not a runtime condition.
    pub async fn execute(&self, job: &Job, logger: &ExecutionLogger) -> Result<()> {
        let executor = self.executor_for(job);
        assert!(
            executor.supports(job),
            "executor registered for {} jobs does not support them",
            job.kind()
        );
        info!(log_id = %logger.log_id(), job = %job.kind(), build = %job.build().id, "executing job");
        executor.execute(job, logger).await
    }
}
