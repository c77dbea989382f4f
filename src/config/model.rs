// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [container]
/// binary_path = "/usr/bin/docker"
/// helper_image = "alpine"
///
/// [paths]
/// upload_dir = "/var/feater/uploads"
/// guest_root = "/var/feater"
/// host_root = "/srv/feater"
///
/// [logs]
/// dir = ".feater/logs"
/// ```
///
/// Only `[paths].upload_dir` is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub container: ContainerConfig,

    #[serde(default)]
    pub paths: RawPathsSection,

    #[serde(default)]
    pub logs: LogsConfig,
}

/// `[container]` section: how to reach the container-management binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerConfig {
    /// Path (or bare name resolved through `PATH`) of the binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Image for the short-lived helper container used to fill volumes. Must
    /// provide `ash` and `cp`.
    #[serde(default = "default_helper_image")]
    pub helper_image: String,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("docker")
}

fn default_helper_image() -> String {
    "alpine".to_string()
}

impl ContainerConfig {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            helper_image: default_helper_image(),
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            helper_image: default_helper_image(),
        }
    }
}

/// `[paths]` section as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPathsSection {
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
    #[serde(default)]
    pub guest_root: Option<PathBuf>,
    #[serde(default)]
    pub host_root: Option<PathBuf>,
}

/// Validated `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Directory holding uploaded asset archives (`<id>.tar`).
    pub upload_dir: PathBuf,
    /// Maps paths seen by this process onto paths seen by the container
    /// daemon's host. `None` when both see the same tree.
    pub root_mapping: Option<RootMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMapping {
    pub guest_root: PathBuf,
    pub host_root: PathBuf,
}

/// `[logs]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogsConfig {
    /// Directory for persisted execution logs.
    #[serde(default = "default_logs_dir")]
    pub dir: PathBuf,
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from(".feater/logs")
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: default_logs_dir(),
        }
    }
}

/// Validated configuration. Construct through `ConfigFile::try_from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub container: ContainerConfig,
    pub paths: PathsConfig,
    pub logs: LogsConfig,
}
