use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Boxed future returned by the object-safe traits at the crate's seams
/// (process runners, repositories, job executors).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The build a job belongs to.
///
/// Owned by the orchestrator; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    /// Absolute working directory of the build. Container CLI invocations run
    /// here.
    pub full_build_path: PathBuf,
}

impl Build {
    pub fn new(id: impl Into<String>, full_build_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            full_build_path: full_build_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.full_build_path
    }
}

/// The same location seen from inside this process (`guest`) and from the
/// host running the container daemon (`host`).
///
/// They differ when this process itself runs in a container with the build
/// tree bind-mounted from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub host: PathBuf,
    pub guest: PathBuf,
}
