// src/log/logger.rs

//! Structured logger bound to a single execution log.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::log::model::{CommandLog, LogFields, LogLevel, LogLine, LogStatus};
use crate::log::repository::CommandLogRepository;
use crate::log::LogError;

/// Writes lines and status transitions for exactly one `CommandLog`.
///
/// Every line is appended to the persisted record and forwarded to `tracing`
/// with the log id attached. Status moves `pending -> running ->
/// {completed | failed}`; a second terminal transition is rejected with
/// [`LogError::AlreadyFinalized`].
///
/// The logger is handed by reference to whatever runs under it (commands, job
/// executors, the process supervisor), so it is never shared beyond the
/// execution that created it.
pub struct ExecutionLogger {
    log_id: Uuid,
    repository: Arc<dyn CommandLogRepository>,
    status: Mutex<LogStatus>,
}

impl ExecutionLogger {
    /// Bind a logger to a freshly created record.
    pub fn new(log: &CommandLog, repository: Arc<dyn CommandLogRepository>) -> Self {
        Self {
            log_id: log.id,
            repository,
            status: Mutex::new(log.status),
        }
    }

    pub fn log_id(&self) -> Uuid {
        self.log_id
    }

    pub fn status(&self) -> LogStatus {
        *self.lock_status()
    }

    pub async fn info(&self, message: impl Into<String>) -> Result<(), LogError> {
        self.info_with(message, LogFields::new()).await
    }

    pub async fn info_with(
        &self,
        message: impl Into<String>,
        fields: LogFields,
    ) -> Result<(), LogError> {
        let line = LogLine::new(LogLevel::Info, message, fields);
        info!(log_id = %self.log_id, fields = ?line.fields, "{}", line.message);
        self.repository.append_line(self.log_id, line).await
    }

    pub async fn error(
        &self,
        message: impl Into<String>,
        fields: LogFields,
    ) -> Result<(), LogError> {
        let line = LogLine::new(LogLevel::Error, message, fields);
        error!(log_id = %self.log_id, fields = ?line.fields, "{}", line.message);
        self.repository.append_line(self.log_id, line).await
    }

    pub async fn mark_as_running(&self) -> Result<(), LogError> {
        {
            let mut status = self.lock_status();
            if *status != LogStatus::Pending {
                return Err(LogError::InvalidTransition {
                    from: *status,
                    to: LogStatus::Running,
                });
            }
            *status = LogStatus::Running;
        }
        self.persist(LogStatus::Running).await
    }

    pub async fn mark_as_completed(&self) -> Result<(), LogError> {
        self.finalize(LogStatus::Completed).await
    }

    pub async fn mark_as_failed(&self) -> Result<(), LogError> {
        self.finalize(LogStatus::Failed).await
    }

    /// Claim `terminal` and persist it.
    ///
    /// The in-memory status is claimed before the first await so that two
    /// racing finalizations cannot both succeed. If persisting fails the claim
    /// is released, so the record can still be finalized the other way.
    async fn finalize(&self, terminal: LogStatus) -> Result<(), LogError> {
        let previous = {
            let mut status = self.lock_status();
            if status.is_terminal() {
                return Err(LogError::AlreadyFinalized { status: *status });
            }
            std::mem::replace(&mut *status, terminal)
        };

        let persisted = self.persist(terminal).await;
        if persisted.is_err() {
            let mut status = self.lock_status();
            if *status == terminal {
                *status = previous;
            }
        }
        persisted
    }

    async fn persist(&self, status: LogStatus) -> Result<(), LogError> {
        debug!(log_id = %self.log_id, %status, "execution log status changed");
        self.repository.update_status(self.log_id, status).await
    }

    fn lock_status(&self) -> MutexGuard<'_, LogStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ExecutionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionLogger")
            .field("log_id", &self.log_id)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::model::LogContext;
    use crate::log::repository::InMemoryCommandLogRepository;

    async fn logger() -> (ExecutionLogger, InMemoryCommandLogRepository) {
        let repo = InMemoryCommandLogRepository::new();
        let log = repo.create(&LogContext::new("b", "test")).await.unwrap();
        let logger = ExecutionLogger::new(&log, Arc::new(repo.clone()));
        (logger, repo)
    }

    #[tokio::test]
    async fn lines_are_persisted_in_order_with_levels() {
        let (logger, repo) = logger().await;
        logger.info("first").await.unwrap();
        let mut fields = LogFields::new();
        fields.insert("code".to_string(), "1".to_string());
        logger.error("second", fields).await.unwrap();

        let log = repo.get(logger.log_id()).unwrap();
        assert_eq!(log.messages().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(log.lines[0].level, LogLevel::Info);
        assert_eq!(log.lines[1].level, LogLevel::Error);
        assert_eq!(log.lines[1].fields.get("code").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn second_terminal_transition_is_rejected() {
        let (logger, repo) = logger().await;
        logger.mark_as_running().await.unwrap();
        logger.mark_as_completed().await.unwrap();

        match logger.mark_as_failed().await {
            Err(LogError::AlreadyFinalized { status }) => assert_eq!(status, LogStatus::Completed),
            other => panic!("expected AlreadyFinalized, got {other:?}"),
        }
        assert!(matches!(
            logger.mark_as_completed().await,
            Err(LogError::AlreadyFinalized { .. })
        ));
        assert_eq!(repo.get(logger.log_id()).unwrap().status, LogStatus::Completed);
    }

    #[tokio::test]
    async fn running_is_only_reachable_from_pending() {
        let (logger, _repo) = logger().await;
        logger.mark_as_failed().await.unwrap();
        assert!(matches!(
            logger.mark_as_running().await,
            Err(LogError::InvalidTransition {
                from: LogStatus::Failed,
                to: LogStatus::Running
            })
        ));
    }

    /// Rejects the first write of `reject` and forwards everything else.
    struct RejectStatusOnce {
        inner: InMemoryCommandLogRepository,
        reject: Mutex<Option<LogStatus>>,
    }

    impl CommandLogRepository for RejectStatusOnce {
        fn create<'a>(
            &'a self,
            context: &'a LogContext,
        ) -> crate::types::BoxFuture<'a, Result<CommandLog, LogError>> {
            self.inner.create(context)
        }

        fn append_line(&self, id: Uuid, line: LogLine) -> crate::types::BoxFuture<'_, Result<(), LogError>> {
            self.inner.append_line(id, line)
        }

        fn update_status(&self, id: Uuid, status: LogStatus) -> crate::types::BoxFuture<'_, Result<(), LogError>> {
            let mut reject = self.reject.lock().unwrap();
            if *reject == Some(status) {
                *reject = None;
                return Box::pin(async { Err(LogError::Storage("disk full".to_string())) });
            }
            self.inner.update_status(id, status)
        }

        fn find(&self, id: Uuid) -> crate::types::BoxFuture<'_, Result<Option<CommandLog>, LogError>> {
            self.inner.find(id)
        }
    }

    #[tokio::test]
    async fn unpersisted_finalization_can_be_retried_the_other_way() {
        let repo = InMemoryCommandLogRepository::new();
        let log = repo.create(&LogContext::new("b", "test")).await.unwrap();
        let logger = ExecutionLogger::new(
            &log,
            Arc::new(RejectStatusOnce {
                inner: repo.clone(),
                reject: Mutex::new(Some(LogStatus::Completed)),
            }),
        );
        logger.mark_as_running().await.unwrap();

        assert!(matches!(
            logger.mark_as_completed().await,
            Err(LogError::Storage(_))
        ));
        assert_eq!(logger.status(), LogStatus::Running);

        logger.mark_as_failed().await.unwrap();
        let stored = repo.get(logger.log_id()).unwrap();
        assert_eq!(stored.status, LogStatus::Failed);
        assert!(stored.completed_at.is_none());
    }

    #[tokio::test]
    async fn lines_may_follow_finalization() {
        let (logger, repo) = logger().await;
        logger.mark_as_completed().await.unwrap();
        logger.info("Command completed.").await.unwrap();
        let log = repo.get(logger.log_id()).unwrap();
        assert_eq!(log.lines.last().unwrap().message, "Command completed.");
    }
}
