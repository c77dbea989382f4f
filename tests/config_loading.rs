// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use feater_exec::config::{load_and_validate, RootMapping};
use feater_exec::errors::ExecError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = config_file(contents);
    match load_and_validate(file.path()) {
        Err(ExecError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(cfg) => panic!("Expected error, got Ok({:?})", cfg),
    }
}

#[test]
fn test_minimal_config_uses_defaults() {
    let file = config_file(
        r#"
[paths]
upload_dir = "/var/feater/uploads"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.container.binary_path, PathBuf::from("docker"));
    assert_eq!(cfg.container.helper_image, "alpine");
    assert_eq!(cfg.paths.upload_dir, PathBuf::from("/var/feater/uploads"));
    assert_eq!(cfg.paths.root_mapping, None);
    assert_eq!(cfg.logs.dir, PathBuf::from(".feater/logs"));
}

#[test]
fn test_full_config() {
    let file = config_file(
        r#"
[container]
binary_path = "/usr/bin/docker"
helper_image = "busybox"

[paths]
upload_dir = "/var/feater/uploads"
guest_root = "/var/feater"
host_root = "/srv/feater"

[logs]
dir = "/var/log/feater"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.container.binary_path, PathBuf::from("/usr/bin/docker"));
    assert_eq!(cfg.container.helper_image, "busybox");
    assert_eq!(
        cfg.paths.root_mapping,
        Some(RootMapping {
            guest_root: PathBuf::from("/var/feater"),
            host_root: PathBuf::from("/srv/feater"),
        })
    );
    assert_eq!(cfg.logs.dir, PathBuf::from("/var/log/feater"));
}

#[test]
fn test_missing_upload_dir() {
    let msg = expect_config_error("[container]\nbinary_path = \"docker\"\n");
    assert_eq!(msg, "[paths].upload_dir is required");
}

#[test]
fn test_relative_upload_dir() {
    let msg = expect_config_error("[paths]\nupload_dir = \"uploads\"\n");
    assert!(msg.contains("must be absolute"), "{msg}");
}

#[test]
fn test_half_root_mapping() {
    let msg = expect_config_error(
        r#"
[paths]
upload_dir = "/uploads"
guest_root = "/var/feater"
"#,
    );
    assert_eq!(msg, "[paths].guest_root and [paths].host_root must be set together");
}

#[test]
fn test_empty_binary_path() {
    let msg = expect_config_error(
        r#"
[container]
binary_path = ""

[paths]
upload_dir = "/uploads"
"#,
    );
    assert_eq!(msg, "[container].binary_path must not be empty");
}

#[test]
fn test_invalid_toml_is_a_toml_error() {
    let file = config_file("[paths\nupload_dir = ");
    assert!(matches!(load_and_validate(file.path()), Err(ExecError::TomlError(_))));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = load_and_validate("/nonexistent/Feater.toml");
    assert!(matches!(result, Err(ExecError::IoError(_))));
}
