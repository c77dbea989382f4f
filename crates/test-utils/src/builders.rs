#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use feater_exec::command::{
    CommandExecutor, CommandOutput, ContextAwareCommand, ContextAwareCommandExecutor,
};
use feater_exec::config::{ConfigFile, ContainerConfig, RawConfigFile, RootMapping};
use feater_exec::errors::Result;
use feater_exec::fs::mock::MockFileSystem;
use feater_exec::job::{
    AssetRepository, ConfiguredPathResolver, ContainerCli, CreateVolumeFromAssetExecutor,
    ExecuteServiceCommandExecutor, JobRegistry, UploadDirAssetRepository,
};
use feater_exec::log::{CommandLog, CommandLogRepository, InMemoryCommandLogRepository};
use feater_exec::process::ProcessRunner;
use feater_exec::types::Build;

use crate::fake_runner::FakeProcessRunner;
use crate::fakes::{FailingLogRepository, RecordingExtractor};

pub const UPLOAD_DIR: &str = "/uploads";

/// Build with id `1` rooted at `/b/1`.
pub fn build_1() -> Build {
    Build::new("1", "/b/1")
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.paths.upload_dir = Some(PathBuf::from(UPLOAD_DIR));
        Self { config }
    }

    pub fn binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.container.binary_path = path.into();
        self
    }

    pub fn helper_image(mut self, image: &str) -> Self {
        self.config.container.helper_image = image.to_string();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.paths.upload_dir = Some(dir.into());
        self
    }

    pub fn root_mapping(mut self, guest_root: &str, host_root: &str) -> Self {
        self.config.paths.guest_root = Some(PathBuf::from(guest_root));
        self.config.paths.host_root = Some(PathBuf::from(host_root));
        self
    }

    pub fn logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.logs.dir = dir.into();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully wired executor stack over in-memory collaborators.
///
/// Keeps a handle to every fake so tests can inspect what happened.
pub struct Harness {
    pub logs: InMemoryCommandLogRepository,
    pub fs: MockFileSystem,
    pub runner: FakeProcessRunner,
    pub extractor: RecordingExtractor,
    pub executor: ContextAwareCommandExecutor,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Run `command` and return its result together with the log it created.
    pub async fn run<C>(&self, command: &C) -> (Result<CommandOutput>, CommandLog)
    where
        C: ContextAwareCommand + ?Sized,
    {
        let before: HashSet<_> = self.logs.all().into_iter().map(|log| log.id).collect();
        let result = self.executor.execute(command).await;

        let mut created: Vec<CommandLog> = self
            .logs
            .all()
            .into_iter()
            .filter(|log| !before.contains(&log.id))
            .collect();
        assert_eq!(created.len(), 1, "expected exactly one new execution log");
        (result, created.remove(0))
    }
}

pub struct HarnessBuilder {
    binary_path: PathBuf,
    root_mapping: Option<RootMapping>,
    runner: FakeProcessRunner,
    process_runner: Option<Arc<dyn ProcessRunner>>,
    extractor: RecordingExtractor,
    assets: Option<Arc<dyn AssetRepository>>,
    uploaded: Vec<String>,
    failing_logs: Option<FailingLogRepository>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("docker"),
            root_mapping: None,
            runner: FakeProcessRunner::new(),
            process_runner: None,
            extractor: RecordingExtractor::new(),
            assets: None,
            uploaded: Vec::new(),
            failing_logs: None,
        }
    }
}

impl HarnessBuilder {
    pub fn binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    pub fn root_mapping(mut self, guest_root: &str, host_root: &str) -> Self {
        self.root_mapping = Some(RootMapping {
            guest_root: PathBuf::from(guest_root),
            host_root: PathBuf::from(host_root),
        });
        self
    }

    pub fn runner(mut self, runner: FakeProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Use `runner` for every process instead of the scripted fake.
    pub fn process_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.process_runner = Some(runner);
        self
    }

    pub fn extractor(mut self, extractor: RecordingExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn assets(mut self, assets: Arc<dyn AssetRepository>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Route log writes through `logs`. `Harness::logs` then shows only the
    /// writes it let through.
    pub fn failing_logs(mut self, logs: FailingLogRepository) -> Self {
        self.failing_logs = Some(logs);
        self
    }

    /// Put `<UPLOAD_DIR>/<id>.tar` into the mock filesystem.
    pub fn uploaded(mut self, asset_id: &str) -> Self {
        self.uploaded.push(asset_id.to_string());
        self
    }

    pub fn build(self) -> Harness {
        let fs = MockFileSystem::new();
        for id in &self.uploaded {
            fs.add_file(PathBuf::from(UPLOAD_DIR).join(format!("{id}.tar")));
        }

        let (logs, log_store) = match self.failing_logs {
            Some(failing) => (
                failing.inner(),
                Arc::new(failing) as Arc<dyn CommandLogRepository>,
            ),
            None => {
                let logs = InMemoryCommandLogRepository::new();
                (logs.clone(), Arc::new(logs) as Arc<dyn CommandLogRepository>)
            }
        };
        let runner: Arc<dyn ProcessRunner> = match self.process_runner {
            Some(runner) => runner,
            None => Arc::new(self.runner.clone()),
        };
        let assets = self.assets.unwrap_or_else(|| {
            Arc::new(UploadDirAssetRepository::new(UPLOAD_DIR, Arc::new(fs.clone())))
        });

        let container = ContainerCli::new(ContainerConfig::new(self.binary_path), Arc::clone(&runner));
        let create_volume = CreateVolumeFromAssetExecutor::new(
            assets,
            Arc::new(ConfiguredPathResolver::new(UPLOAD_DIR, self.root_mapping)),
            Arc::new(fs.clone()),
            Arc::new(self.extractor.clone()),
            container.clone(),
        );
        let registry = JobRegistry::new(
            Box::new(create_volume),
            Box::new(ExecuteServiceCommandExecutor::new(container)),
        );
        let executor = ContextAwareCommandExecutor::new(
            log_store,
            CommandExecutor::new(registry, runner, Arc::new(fs.clone())),
        );

        Harness {
            logs,
            fs,
            runner: self.runner,
            extractor: self.extractor,
            executor,
        }
    }
}
