// src/job/container.rs

//! Invocations of the container-management binary.

use std::path::Path;
use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::errors::Result;
use crate::log::ExecutionLogger;
use crate::process::{require_success, Invocation, ProcessRunner};

/// Builds container CLI invocations from injected configuration and runs them
/// through a [`ProcessRunner`].
#[derive(Clone)]
pub struct ContainerCli {
    config: ContainerConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl ContainerCli {
    pub fn new(config: ContainerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    /// `volume create --name <volume>`
    pub fn volume_create(&self, volume_name: &str, working_dir: &Path) -> Invocation {
        self.invocation(working_dir)
            .args(["volume", "create", "--name", volume_name])
    }

    /// Copy a host directory into a named volume through a throwaway helper
    /// container that mounts both.
    pub fn copy_into_volume(
        &self,
        source_host_path: &Path,
        volume_name: &str,
        working_dir: &Path,
    ) -> Invocation {
        self.invocation(working_dir).args([
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{}:/source", source_host_path.display()),
            "-v".to_string(),
            format!("{volume_name}:/target"),
            self.config.helper_image.clone(),
            "ash".to_string(),
            "-c".to_string(),
            "cp -av /source/* /target".to_string(),
        ])
    }

    /// `exec <container> <command...>`
    pub fn exec(&self, container_id: &str, command: &[String], working_dir: &Path) -> Invocation {
        self.invocation(working_dir)
            .args(["exec", container_id])
            .args(command.iter().cloned())
    }

    /// Run `invocation`; on failure log `Failed to <action>, ...` and fail
    /// with `CommandExecutionFailed`.
    pub async fn run_step(
        &self,
        invocation: &Invocation,
        logger: &ExecutionLogger,
        action: &str,
    ) -> Result<()> {
        let outcome = self.runner.run(invocation, logger).await;
        require_success(outcome, invocation, logger, action).await
    }

    fn invocation(&self, working_dir: &Path) -> Invocation {
        Invocation::new(&self.config.binary_path, working_dir)
    }
}

impl std::fmt::Debug for ContainerCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerCli")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSupervisor;

    fn cli() -> ContainerCli {
        ContainerCli::new(
            ContainerConfig::new("/usr/bin/docker"),
            Arc::new(ProcessSupervisor::new()),
        )
    }

    #[test]
    fn volume_create_arguments() {
        let inv = cli().volume_create("vol1", Path::new("/b/1"));
        assert_eq!(inv.program, Path::new("/usr/bin/docker"));
        assert_eq!(inv.args, vec!["volume", "create", "--name", "vol1"]);
        assert_eq!(inv.working_dir, Path::new("/b/1"));
    }

    #[test]
    fn copy_into_volume_mounts_source_and_target() {
        let inv = cli().copy_into_volume(Path::new("/b/1/extract/vol1"), "vol1", Path::new("/b/1"));
        assert_eq!(
            inv.args,
            vec![
                "run",
                "--rm",
                "-v",
                "/b/1/extract/vol1:/source",
                "-v",
                "vol1:/target",
                "alpine",
                "ash",
                "-c",
                "cp -av /source/* /target",
            ]
        );
    }

    #[test]
    fn exec_appends_the_service_command() {
        let cmd = vec!["npm".to_string(), "run".to_string(), "migrate".to_string()];
        let inv = cli().exec("c0ffee", &cmd, Path::new("/b/1"));
        assert_eq!(inv.args, vec!["exec", "c0ffee", "npm", "run", "migrate"]);
    }
}
