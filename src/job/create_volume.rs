// src/job/create_volume.rs

//! Fill a fresh named volume with the contents of an uploaded asset archive.

use std::sync::Arc;

use tracing::info;

use crate::errors::{ExecError, Result};
use crate::fs::FileSystem;
use crate::job::assets::{ArchiveExtractor, AssetPathResolver, AssetRepository};
use crate::job::container::ContainerCli;
use crate::job::{Job, JobExecutor};
use crate::log::ExecutionLogger;
use crate::types::{BoxFuture, Build};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateVolumeFromAssetJob {
    pub build: Build,
    pub asset_id: String,
    pub volume_name: String,
}

impl CreateVolumeFromAssetJob {
    pub fn new(build: Build, asset_id: impl Into<String>, volume_name: impl Into<String>) -> Self {
        Self {
            build,
            asset_id: asset_id.into(),
            volume_name: volume_name.into(),
        }
    }
}

pub struct CreateVolumeFromAssetExecutor {
    assets: Arc<dyn AssetRepository>,
    paths: Arc<dyn AssetPathResolver>,
    fs: Arc<dyn FileSystem>,
    extractor: Arc<dyn ArchiveExtractor>,
    container: ContainerCli,
}

impl CreateVolumeFromAssetExecutor {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        paths: Arc<dyn AssetPathResolver>,
        fs: Arc<dyn FileSystem>,
        extractor: Arc<dyn ArchiveExtractor>,
        container: ContainerCli,
    ) -> Self {
        Self {
            assets,
            paths,
            fs,
            extractor,
            container,
        }
    }

    async fn create(&self, job: &CreateVolumeFromAssetJob, logger: &ExecutionLogger) -> Result<()> {
        logger
            .info(format!(
                "Creating volume '{}' from asset '{}'.",
                job.volume_name, job.asset_id
            ))
            .await?;

        // Resolved before any side effect: an unknown asset leaves nothing
        // behind.
        let asset = self.assets.find_uploaded_by_id(&job.asset_id).await?;

        let upload = self.paths.upload_paths(&asset);
        let extract = self.paths.extract_paths(&job.build, &job.volume_name);
        info!(
            log_id = %logger.log_id(),
            asset = %asset.id,
            archive = ?upload.guest,
            extract_dir = ?extract.guest,
            "resolved asset paths"
        );

        self.fs
            .create_dir_all(&extract.guest)
            .map_err(ExecError::filesystem)?;
        self.extractor.extract(&upload.guest, &extract.guest).await?;

        let working_dir = job.build.path();

        let create = self.container.volume_create(&job.volume_name, working_dir);
        self.container
            .run_step(&create, logger, "extract asset")
            .await?;

        let copy = self
            .container
            .copy_into_volume(&extract.host, &job.volume_name, working_dir);
        self.container
            .run_step(&copy, logger, "copy files from asset to volume")
            .await
    }
}

impl JobExecutor for CreateVolumeFromAssetExecutor {
    fn supports(&self, job: &Job) -> bool {
        matches!(job, Job::CreateVolumeFromAsset(_))
    }

    fn execute<'a>(&'a self, job: &'a Job, logger: &'a ExecutionLogger) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Job::CreateVolumeFromAsset(job) = job else {
                unreachable!("create-volume executor received a {} job", job.kind());
            };
            self.create(job, logger).await
        })
    }
}
