use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use feater_exec::errors::{ExecError, Result};
use feater_exec::job::{ArchiveExtractor, Asset, AssetRepository};
use feater_exec::log::{
    CommandLog, CommandLogRepository, InMemoryCommandLogRepository, LogContext, LogError, LogLine,
    LogStatus,
};
use feater_exec::types::BoxFuture;
use tracing::debug;
use uuid::Uuid;

/// Asset repository backed by a fixed set of uploaded ids.
#[derive(Debug, Clone, Default)]
pub struct FakeAssetRepository {
    uploaded: HashSet<String>,
}

impl FakeAssetRepository {
    pub fn with_assets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uploaded: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl AssetRepository for FakeAssetRepository {
    fn find_uploaded_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Asset>> {
        Box::pin(async move {
            if self.uploaded.contains(id) {
                Ok(Asset::new(id))
            } else {
                Err(ExecError::AssetNotFound(id.to_string()))
            }
        })
    }
}

/// Extractor that only records `(archive, destination)` pairs.
#[derive(Debug, Clone, Default)]
pub struct RecordingExtractor {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    failure: Option<String>,
}

impl RecordingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every extraction fails with an `ExecError::Archive` carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Arc::default(),
            failure: Some(message.into()),
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ArchiveExtractor for RecordingExtractor {
    fn extract<'a>(&'a self, archive: &'a Path, destination: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((archive.to_path_buf(), destination.to_path_buf()));
            match &self.failure {
                Some(message) => Err(ExecError::Archive {
                    archive: archive.to_path_buf(),
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        })
    }
}

#[derive(Debug, Default)]
struct LogFaults {
    statuses: Vec<LogStatus>,
    messages: Vec<String>,
    all_appends: bool,
}

/// Log store that forwards to an in-memory store but rejects chosen writes.
///
/// Rejected writes fail with `LogError::Storage("disk full")` and leave the
/// inner store untouched, so tests can inspect exactly what got through.
#[derive(Debug, Clone, Default)]
pub struct FailingLogRepository {
    inner: InMemoryCommandLogRepository,
    faults: Arc<Mutex<LogFaults>>,
}

impl FailingLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store that receives every write that is not rejected.
    pub fn inner(&self) -> InMemoryCommandLogRepository {
        self.inner.clone()
    }

    /// Reject the next write of `status`.
    pub fn fail_status_once(self, status: LogStatus) -> Self {
        self.faults.lock().unwrap().statuses.push(status);
        self
    }

    /// Reject every append of a line carrying exactly `message`.
    pub fn fail_append(self, message: impl Into<String>) -> Self {
        self.faults.lock().unwrap().messages.push(message.into());
        self
    }

    pub fn fail_all_appends(self) -> Self {
        self.faults.lock().unwrap().all_appends = true;
        self
    }

    fn rejects_status(&self, status: LogStatus) -> bool {
        let mut faults = self.faults.lock().unwrap();
        match faults.statuses.iter().position(|s| *s == status) {
            Some(index) => {
                faults.statuses.remove(index);
                true
            }
            None => false,
        }
    }

    fn rejects_line(&self, line: &LogLine) -> bool {
        let faults = self.faults.lock().unwrap();
        faults.all_appends || faults.messages.iter().any(|m| *m == line.message)
    }
}

fn disk_full() -> LogError {
    LogError::Storage("disk full".to_string())
}

impl CommandLogRepository for FailingLogRepository {
    fn create<'a>(&'a self, context: &'a LogContext) -> BoxFuture<'a, std::result::Result<CommandLog, LogError>> {
        self.inner.create(context)
    }

    fn append_line(&self, id: Uuid, line: LogLine) -> BoxFuture<'_, std::result::Result<(), LogError>> {
        if self.rejects_line(&line) {
            debug!(log_id = %id, message = %line.message, "rejecting log line");
            return Box::pin(async { Err(disk_full()) });
        }
        self.inner.append_line(id, line)
    }

    fn update_status(&self, id: Uuid, status: LogStatus) -> BoxFuture<'_, std::result::Result<(), LogError>> {
        if self.rejects_status(status) {
            debug!(log_id = %id, %status, "rejecting status write");
            return Box::pin(async { Err(disk_full()) });
        }
        self.inner.update_status(id, status)
    }

    fn find(&self, id: Uuid) -> BoxFuture<'_, std::result::Result<Option<CommandLog>, LogError>> {
        self.inner.find(id)
    }
}
