// src/job/assets.rs

//! Collaborators the volume-from-asset executor leans on: asset lookup, path
//! resolution and archive extraction.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::{PathsConfig, RootMapping};
use crate::errors::{ExecError, Result};
use crate::fs::FileSystem;
use crate::types::{BoxFuture, Build, PathPair};

/// An uploaded asset archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
}

impl Asset {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// File name of the uploaded archive inside the upload directory.
    pub fn archive_file_name(&self) -> String {
        format!("{}.tar", self.id)
    }
}

pub trait AssetRepository: Send + Sync {
    /// Look up an asset whose upload has finished.
    ///
    /// Fails with [`ExecError::AssetNotFound`] if there is none.
    fn find_uploaded_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Asset>>;
}

/// Treats every `<upload_dir>/<id>.tar` file as an uploaded asset.
#[derive(Debug, Clone)]
pub struct UploadDirAssetRepository {
    upload_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl UploadDirAssetRepository {
    pub fn new(upload_dir: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            fs,
        }
    }
}

impl AssetRepository for UploadDirAssetRepository {
    fn find_uploaded_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Asset>> {
        Box::pin(async move {
            let asset = Asset::new(id);
            // Ids come from callers; refuse anything that would escape the
            // upload directory.
            let plain = !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != "..";
            if plain && self.fs.is_file(&self.upload_dir.join(asset.archive_file_name())) {
                Ok(asset)
            } else {
                Err(ExecError::AssetNotFound(id.to_string()))
            }
        })
    }
}

/// Resolves where an asset's archive lives and where it gets extracted.
pub trait AssetPathResolver: Send + Sync {
    fn upload_paths(&self, asset: &Asset) -> PathPair;

    /// Build-scoped, volume-scoped extraction directory.
    fn extract_paths(&self, build: &Build, volume_name: &str) -> PathPair;
}

/// Path resolution driven by the `[paths]` config section.
///
/// - upload: `<upload_dir>/<asset-id>.tar`
/// - extract: `<build path>/extract/<volume name>`
///
/// Host forms swap the configured guest root prefix for the host root; paths
/// outside the guest root are the same on both sides.
#[derive(Debug, Clone)]
pub struct ConfiguredPathResolver {
    upload_dir: PathBuf,
    root_mapping: Option<RootMapping>,
}

impl ConfiguredPathResolver {
    pub fn new(upload_dir: impl Into<PathBuf>, root_mapping: Option<RootMapping>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            root_mapping,
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(paths.upload_dir.clone(), paths.root_mapping.clone())
    }

    fn pair(&self, guest: PathBuf) -> PathPair {
        let host = match &self.root_mapping {
            Some(mapping) => match guest.strip_prefix(&mapping.guest_root) {
                Ok(rest) => mapping.host_root.join(rest),
                Err(_) => guest.clone(),
            },
            None => guest.clone(),
        };
        PathPair { host, guest }
    }
}

impl AssetPathResolver for ConfiguredPathResolver {
    fn upload_paths(&self, asset: &Asset) -> PathPair {
        self.pair(self.upload_dir.join(asset.archive_file_name()))
    }

    fn extract_paths(&self, build: &Build, volume_name: &str) -> PathPair {
        self.pair(build.full_build_path.join("extract").join(volume_name))
    }
}

pub trait ArchiveExtractor: Send + Sync {
    /// Unpack `archive` into `destination`, which already exists.
    fn extract<'a>(&'a self, archive: &'a Path, destination: &'a Path) -> BoxFuture<'a, Result<()>>;
}

/// Extracts plain tar archives with the `tar` crate on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct TarExtractor;

impl ArchiveExtractor for TarExtractor {
    fn extract<'a>(&'a self, archive: &'a Path, destination: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let archive_path = archive.to_path_buf();
            let destination = destination.to_path_buf();
            debug!(archive = ?archive_path, destination = ?destination, "extracting archive");

            let unpack_archive = archive_path.clone();
            let unpacked = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
                let file = File::open(&unpack_archive)?;
                tar::Archive::new(file).unpack(&destination)
            })
            .await;

            match unpacked {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(ExecError::Archive {
                    archive: archive_path,
                    message: err.to_string(),
                }),
                Err(join_err) => Err(ExecError::Archive {
                    archive: archive_path,
                    message: join_err.to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn paths_without_mapping_are_identical_on_both_sides() {
        let resolver = ConfiguredPathResolver::new("/uploads", None);
        let build = Build::new("1", "/b/1");

        let upload = resolver.upload_paths(&Asset::new("asset-1"));
        assert_eq!(upload.guest, PathBuf::from("/uploads/asset-1.tar"));
        assert_eq!(upload.host, upload.guest);

        let extract = resolver.extract_paths(&build, "vol1");
        assert_eq!(extract.guest, PathBuf::from("/b/1/extract/vol1"));
        assert_eq!(extract.host, extract.guest);
    }

    #[test]
    fn host_paths_swap_the_guest_root() {
        let resolver = ConfiguredPathResolver::new(
            "/var/feater/uploads",
            Some(RootMapping {
                guest_root: PathBuf::from("/var/feater"),
                host_root: PathBuf::from("/srv/feater"),
            }),
        );
        let build = Build::new("7", "/var/feater/builds/7");

        let extract = resolver.extract_paths(&build, "data");
        assert_eq!(extract.guest, PathBuf::from("/var/feater/builds/7/extract/data"));
        assert_eq!(extract.host, PathBuf::from("/srv/feater/builds/7/extract/data"));

        let outside = resolver.extract_paths(&Build::new("8", "/tmp/8"), "data");
        assert_eq!(outside.host, PathBuf::from("/tmp/8/extract/data"));
    }

    #[tokio::test]
    async fn upload_dir_repository_finds_only_existing_archives() {
        let fs = MockFileSystem::new();
        fs.add_file("/uploads/asset-1.tar");
        let repo = UploadDirAssetRepository::new("/uploads", Arc::new(fs));

        assert_eq!(
            repo.find_uploaded_by_id("asset-1").await.unwrap(),
            Asset::new("asset-1")
        );
        assert!(matches!(
            repo.find_uploaded_by_id("missing").await,
            Err(ExecError::AssetNotFound(id)) if id == "missing"
        ));
        assert!(matches!(
            repo.find_uploaded_by_id("../asset-1").await,
            Err(ExecError::AssetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn tar_extractor_unpacks_into_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, b"hello volume").unwrap();

        let archive_path = dir.path().join("asset.tar");
        {
            let mut builder = tar::Builder::new(File::create(&archive_path).unwrap());
            builder.append_path_with_name(&source, "data/hello.txt").unwrap();
            builder.finish().unwrap();
        }

        let destination = dir.path().join("extract");
        std::fs::create_dir_all(&destination).unwrap();
        TarExtractor.extract(&archive_path, &destination).await.unwrap();

        let extracted = std::fs::read_to_string(destination.join("data/hello.txt")).unwrap();
        assert_eq!(extracted, "hello volume");
    }

    #[tokio::test]
    async fn missing_archive_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TarExtractor
            .extract(&dir.path().join("nope.tar"), dir.path())
            .await;
        assert!(matches!(result, Err(ExecError::Archive { .. })));
    }
}
