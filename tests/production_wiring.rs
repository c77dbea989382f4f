// tests/production_wiring.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::{init_tracing, messages, with_timeout};

use std::sync::Arc;

use feater_exec::build_executor;
use feater_exec::command::context::COMMAND_COMPLETED;
use feater_exec::command::JobCommand;
use feater_exec::job::{CreateVolumeFromAssetJob, ExecuteServiceCommandJob};
use feater_exec::log::{
    CommandLog, CommandLogRepository, ExecutionLogger, FileCommandLogRepository, LogContext,
    LogStatus,
};
use feater_exec::process::{Invocation, ProcessSupervisor};
use feater_exec::types::Build;
use uuid::Uuid;

/// Every log stored under `dir`, read back through a fresh repository.
async fn stored_logs(dir: &std::path::Path) -> Vec<CommandLog> {
    let repository = FileCommandLogRepository::new(dir);
    let ids: Vec<Uuid> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .map(|path| path.file_stem().unwrap().to_str().unwrap().parse().unwrap())
        .collect();

    let mut logs = Vec::new();
    for id in ids {
        logs.push(repository.find(id).await.unwrap().unwrap());
    }
    logs
}

// `echo` stands in for the container binary: it exits 0 and prints its
// arguments, so the invocation ends up in the log.
#[tokio::test]
async fn service_command_is_persisted_to_disk() {
    init_tracing();
    let logs_dir = tempfile::tempdir().unwrap();
    let build_dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .binary_path("echo")
        .logs_dir(logs_dir.path())
        .build();
    let repository = Arc::new(FileCommandLogRepository::new(cfg.logs.dir.clone()));
    let executor = build_executor(&cfg, repository);

    let job = ExecuteServiceCommandJob::new(Build::new("1", build_dir.path()), "c1", ["ls", "-la"]);
    with_timeout(executor.execute(&JobCommand::new(job))).await.unwrap();

    let logs = stored_logs(logs_dir.path()).await;
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.status, LogStatus::Completed);
    assert_eq!(
        messages(log),
        vec![
            "Executing 'ls -la' in container 'c1'.".to_string(),
            "exec c1 ls -la".to_string(),
            COMMAND_COMPLETED.to_string(),
        ]
    );
}

#[tokio::test]
async fn real_tar_archive_is_extracted_before_the_container_steps() {
    init_tracing();
    let logs_dir = tempfile::tempdir().unwrap();
    let upload_dir = tempfile::tempdir().unwrap();
    let build_dir = tempfile::tempdir().unwrap();

    {
        let archive = std::fs::File::create(upload_dir.path().join("asset-1.tar")).unwrap();
        let mut builder = tar::Builder::new(archive);
        let content = b"SELECT 1;\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "dump.sql", &content[..]).unwrap();
        builder.finish().unwrap();
    }

    let cfg = ConfigFileBuilder::new()
        .binary_path("echo")
        .upload_dir(upload_dir.path())
        .logs_dir(logs_dir.path())
        .build();
    let executor = build_executor(&cfg, Arc::new(FileCommandLogRepository::new(logs_dir.path())));

    let job = CreateVolumeFromAssetJob::new(Build::new("1", build_dir.path()), "asset-1", "vol1");
    with_timeout(executor.execute(&JobCommand::new(job))).await.unwrap();

    let extracted = build_dir.path().join("extract").join("vol1").join("dump.sql");
    assert_eq!(std::fs::read_to_string(extracted).unwrap(), "SELECT 1;\n");

    let log = stored_logs(logs_dir.path()).await.remove(0);
    assert_eq!(log.status, LogStatus::Completed);
    assert!(messages(&log).contains(&"volume create --name vol1".to_string()));
}

#[tokio::test]
async fn chatty_process_streams_into_the_file_store() {
    init_tracing();
    let logs_dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(FileCommandLogRepository::new(logs_dir.path()));
    let log = repository.create(&LogContext::new("1", "chatty")).await.unwrap();
    let logger = ExecutionLogger::new(&log, repository.clone());

    let script = "i=0; while [ $i -lt 3000 ]; do echo progress-$i; i=$((i+1)); done";
    let invocation = Invocation::new("sh", logs_dir.path()).args(["-c", script]);
    let outcome = with_timeout(ProcessSupervisor::new().supervise(&invocation, &logger)).await;
    assert!(outcome.is_success(), "unexpected outcome: {outcome}");

    let stored = stored_logs(logs_dir.path()).await.remove(0);
    assert_eq!(stored.lines.len(), 3000);
    assert_eq!(stored.lines[0].message, "progress-0");
    assert_eq!(stored.lines[2999].message, "progress-2999");
}
