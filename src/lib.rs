// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod fs;
pub mod job;
pub mod log;
pub mod logging;
pub mod process;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{BuildArgs, CliArgs, CliCommand};
use crate::command::{CommandExecutor, ContextAwareCommandExecutor, JobCommand};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::{
    ConfiguredPathResolver, ContainerCli, CreateVolumeFromAssetExecutor, CreateVolumeFromAssetJob,
    ExecuteServiceCommandExecutor, ExecuteServiceCommandJob, Job, JobRegistry, TarExtractor,
    UploadDirAssetRepository,
};
use crate::log::{CommandLogRepository, FileCommandLogRepository};
use crate::process::{ProcessRunner, ProcessSupervisor};
use crate::types::Build;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, wires the production executor stack and runs the
/// requested subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    debug!(?cfg, "loaded config");

    let repository = Arc::new(FileCommandLogRepository::new(cfg.logs.dir.clone()));

    match args.command {
        CliCommand::CreateVolume {
            build,
            asset_id,
            volume_name,
        } => {
            let job = CreateVolumeFromAssetJob::new(to_build(build), asset_id, volume_name);
            run_job(&cfg, repository, job.into()).await
        }
        CliCommand::Exec {
            build,
            container,
            command,
        } => {
            let job = ExecuteServiceCommandJob::new(to_build(build), container, command);
            run_job(&cfg, repository, job.into()).await
        }
        CliCommand::ShowLog { log_id } => {
            let log = repository
                .find(log_id)
                .await?
                .with_context(|| format!("no execution log with id {log_id}"))?;
            println!("{}", serde_json::to_string_pretty(&log)?);
            Ok(())
        }
    }
}

/// Wire the production executor stack from a validated config.
///
/// Everything below the returned executor talks to the real filesystem and
/// spawns the configured container binary.
pub fn build_executor(
    cfg: &ConfigFile,
    repository: Arc<dyn CommandLogRepository>,
) -> ContextAwareCommandExecutor {
    let runner: Arc<dyn ProcessRunner> = Arc::new(ProcessSupervisor::new());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let container = ContainerCli::new(cfg.container.clone(), Arc::clone(&runner));

    let create_volume = CreateVolumeFromAssetExecutor::new(
        Arc::new(UploadDirAssetRepository::new(
            cfg.paths.upload_dir.clone(),
            Arc::clone(&fs),
        )),
        Arc::new(ConfiguredPathResolver::from_config(&cfg.paths)),
        Arc::clone(&fs),
        Arc::new(TarExtractor),
        container.clone(),
    );
    let service_command = ExecuteServiceCommandExecutor::new(container);

    let registry = JobRegistry::new(Box::new(create_volume), Box::new(service_command));
    let executor = CommandExecutor::new(registry, runner, fs);
    ContextAwareCommandExecutor::new(repository, executor)
}

async fn run_job(
    cfg: &ConfigFile,
    repository: Arc<FileCommandLogRepository>,
    job: Job,
) -> Result<()> {
    let executor = build_executor(cfg, repository);
    let command = JobCommand::new(job);
    let output = executor.execute(&command).await?;
    info!(?output, job = %command.job().kind(), "job finished");
    Ok(())
}

fn to_build(args: BuildArgs) -> Build {
    Build::new(args.build_id, args.build_path)
}
