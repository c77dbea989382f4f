// src/config/validate.rs

use crate::config::model::{ConfigFile, PathsConfig, RawConfigFile, RootMapping};
use crate::errors::{ExecError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ExecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_container(&raw)?;
        let paths = validate_paths(&raw)?;
        Ok(ConfigFile {
            container: raw.container,
            paths,
            logs: raw.logs,
        })
    }
}

fn validate_container(cfg: &RawConfigFile) -> Result<()> {
    if cfg.container.binary_path.as_os_str().is_empty() {
        return Err(ExecError::ConfigError(
            "[container].binary_path must not be empty".to_string(),
        ));
    }
    if cfg.container.helper_image.trim().is_empty() {
        return Err(ExecError::ConfigError(
            "[container].helper_image must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<PathsConfig> {
    let upload_dir = cfg.paths.upload_dir.clone().ok_or_else(|| {
        ExecError::ConfigError("[paths].upload_dir is required".to_string())
    })?;
    if !upload_dir.is_absolute() {
        return Err(ExecError::ConfigError(format!(
            "[paths].upload_dir must be absolute (got {:?})",
            upload_dir
        )));
    }

    let root_mapping = match (&cfg.paths.guest_root, &cfg.paths.host_root) {
        (Some(guest_root), Some(host_root)) => Some(RootMapping {
            guest_root: guest_root.clone(),
            host_root: host_root.clone(),
        }),
        (None, None) => None,
        _ => {
            return Err(ExecError::ConfigError(
                "[paths].guest_root and [paths].host_root must be set together".to_string(),
            ));
        }
    };

    Ok(PathsConfig {
        upload_dir,
        root_mapping,
    })
}
