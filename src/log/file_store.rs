// src/log/file_store.rs

//! Execution logs stored on disk, one pair of files per log.
//!
//! - `<dir>/<log-id>.json` holds the record header (ids, description, status
//!   and timestamps). It is rewritten through a temporary file on create and
//!   on every status change, so a reader never observes a half-written header.
//! - `<dir>/<log-id>.lines.jsonl` holds the lines, one JSON object per line.
//!   Appends only ever add to the end of this file.
//!
//! Appending a line therefore costs the same no matter how long the log
//! already is. An entry left unreadable by an interrupted append is skipped
//! when the log is read back.

use std::path::PathBuf;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::log::model::{CommandLog, LogContext, LogLine, LogStatus};
use crate::log::repository::CommandLogRepository;
use crate::log::LogError;
use crate::types::BoxFuture;

#[derive(Debug)]
pub struct FileCommandLogRepository {
    dir: PathBuf,
    // Serializes writes within this process so lines land in call order.
    write_lock: Mutex<()>,
}

impl FileCommandLogRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn header_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn lines_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.lines.jsonl"))
    }

    async fn load_header(&self, id: Uuid) -> Result<Option<CommandLog>, LogError> {
        match fs::read(self.header_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn store_header(&self, log: &CommandLog) -> Result<(), LogError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.header_path(log.id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(log)?;
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!(log_id = %log.id, path = ?path, status = %log.status, "stored execution log header");
        Ok(())
    }

    async fn load_lines(&self, id: Uuid) -> Result<Vec<LogLine>, LogError> {
        let contents = match fs::read_to_string(self.lines_path(id)).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let lines: Vec<LogLine> = contents
            .lines()
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| match serde_json::from_str(entry) {
                Ok(line) => Some(line),
                Err(err) => {
                    warn!(log_id = %id, error = %err, "skipping unreadable execution log line");
                    None
                }
            })
            .collect();
        Ok(lines)
    }
}

impl CommandLogRepository for FileCommandLogRepository {
    fn create<'a>(&'a self, context: &'a LogContext) -> BoxFuture<'a, Result<CommandLog, LogError>> {
        Box::pin(async move {
            let log = CommandLog::pending(context);
            let _guard = self.write_lock.lock().await;
            self.store_header(&log).await?;
            Ok(log)
        })
    }

    fn append_line(&self, id: Uuid, line: LogLine) -> BoxFuture<'_, Result<(), LogError>> {
        Box::pin(async move {
            let mut entry = serde_json::to_vec(&line)?;
            entry.push(b'\n');

            let _guard = self.write_lock.lock().await;
            if !fs::try_exists(self.header_path(id)).await? {
                return Err(LogError::NotFound(id));
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.lines_path(id))
                .await?;
            file.write_all(&entry).await?;
            file.flush().await?;
            Ok(())
        })
    }

    fn update_status(&self, id: Uuid, status: LogStatus) -> BoxFuture<'_, Result<(), LogError>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut header = self.load_header(id).await?.ok_or(LogError::NotFound(id))?;
            header.set_status(status);
            self.store_header(&header).await
        })
    }

    fn find(&self, id: Uuid) -> BoxFuture<'_, Result<Option<CommandLog>, LogError>> {
        Box::pin(async move {
            let Some(mut log) = self.load_header(id).await? else {
                return Ok(None);
            };
            for line in self.load_lines(id).await? {
                if line.logged_at > log.updated_at {
                    log.updated_at = line.logged_at;
                }
                log.lines.push(line);
            }
            Ok(Some(log))
        })
    }
}
