// src/log/repository.rs

//! Persistence contract for execution logs.
//!
//! The execution core only ever needs to create a record, append lines to it,
//! move its status, and (for display) read it back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::log::model::{CommandLog, LogContext, LogLine, LogStatus};
use crate::log::LogError;
use crate::types::BoxFuture;

/// Abstract execution-log store.
///
/// Production uses [`super::FileCommandLogRepository`]; tests usually use
/// [`InMemoryCommandLogRepository`] and inspect the stored records.
pub trait CommandLogRepository: Send + Sync {
    /// Create and persist a new `pending` record.
    fn create<'a>(&'a self, context: &'a LogContext) -> BoxFuture<'a, Result<CommandLog, LogError>>;

    fn append_line(&self, id: Uuid, line: LogLine) -> BoxFuture<'_, Result<(), LogError>>;

    fn update_status(&self, id: Uuid, status: LogStatus) -> BoxFuture<'_, Result<(), LogError>>;

    fn find(&self, id: Uuid) -> BoxFuture<'_, Result<Option<CommandLog>, LogError>>;
}

/// Stores logs in memory only (lost on restart).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommandLogRepository {
    logs: Arc<Mutex<HashMap<Uuid, CommandLog>>>,
}

impl InMemoryCommandLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored record.
    pub fn get(&self, id: Uuid) -> Option<CommandLog> {
        self.lock().get(&id).cloned()
    }

    /// Snapshot of every stored record, oldest first.
    pub fn all(&self) -> Vec<CommandLog> {
        let mut logs: Vec<CommandLog> = self.lock().values().cloned().collect();
        logs.sort_by_key(|log| log.created_at);
        logs
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, CommandLog>> {
        self.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut CommandLog)) -> Result<(), LogError> {
        let mut logs = self.lock();
        let log = logs.get_mut(&id).ok_or(LogError::NotFound(id))?;
        f(log);
        Ok(())
    }
}

impl CommandLogRepository for InMemoryCommandLogRepository {
    fn create<'a>(&'a self, context: &'a LogContext) -> BoxFuture<'a, Result<CommandLog, LogError>> {
        Box::pin(async move {
            let log = CommandLog::pending(context);
            self.lock().insert(log.id, log.clone());
            Ok(log)
        })
    }

    fn append_line(&self, id: Uuid, line: LogLine) -> BoxFuture<'_, Result<(), LogError>> {
        Box::pin(async move { self.modify(id, |log| log.push_line(line)) })
    }

    fn update_status(&self, id: Uuid, status: LogStatus) -> BoxFuture<'_, Result<(), LogError>> {
        Box::pin(async move { self.modify(id, |log| log.set_status(status)) })
    }

    fn find(&self, id: Uuid) -> BoxFuture<'_, Result<Option<CommandLog>, LogError>> {
        Box::pin(async move { Ok(self.get(id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::model::{LogFields, LogLevel};

    #[tokio::test]
    async fn created_log_starts_pending_and_records_updates() {
        let repo = InMemoryCommandLogRepository::new();
        let log = repo
            .create(&LogContext::new("build-1", "create volume"))
            .await
            .unwrap();
        assert_eq!(log.status, LogStatus::Pending);

        repo.append_line(log.id, LogLine::new(LogLevel::Info, "hello", LogFields::new()))
            .await
            .unwrap();
        repo.update_status(log.id, LogStatus::Failed).await.unwrap();

        let stored = repo.get(log.id).unwrap();
        assert_eq!(stored.status, LogStatus::Failed);
        assert!(stored.failed_at.is_some());
        assert!(stored.completed_at.is_none());
        assert_eq!(stored.messages().collect::<Vec<_>>(), vec!["hello"]);
    }

    #[tokio::test]
    async fn updating_unknown_log_is_not_found() {
        let repo = InMemoryCommandLogRepository::new();
        let missing = Uuid::new_v4();
        match repo.update_status(missing, LogStatus::Running).await {
            Err(LogError::NotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
