// src/log/model.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured key/value fields attached to a log line.
pub type LogFields = BTreeMap<String, String>;

/// Lifecycle of an execution log.
///
/// `Pending -> Running -> {Completed | Failed}`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl LogStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LogStatus::Completed | LogStatus::Failed)
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogStatus::Pending => "pending",
            LogStatus::Running => "running",
            LogStatus::Completed => "completed",
            LogStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: LogFields,
    pub logged_at: DateTime<Utc>,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>, fields: LogFields) -> Self {
        Self {
            level,
            message: message.into(),
            fields,
            logged_at: Utc::now(),
        }
    }
}

/// What a contextual command declares about the log it wants created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub build_id: String,
    pub description: String,
}

impl LogContext {
    pub fn new(build_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            description: description.into(),
        }
    }
}

/// One persisted execution transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLog {
    pub id: Uuid,
    pub build_id: String,
    pub description: String,
    pub status: LogStatus,
    #[serde(default)]
    pub lines: Vec<LogLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
}

impl CommandLog {
    /// A fresh `pending` record for `context`.
    pub fn pending(context: &LogContext) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            build_id: context.build_id.clone(),
            description: context.description.clone(),
            status: LogStatus::Pending,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            failed_at: None,
        }
    }

    pub fn push_line(&mut self, line: LogLine) {
        self.updated_at = line.logged_at;
        self.lines.push(line);
    }

    /// Record a status change and stamp the matching timestamp.
    ///
    /// Transition rules are enforced by `ExecutionLogger`; stores apply
    /// whatever they are given.
    pub fn set_status(&mut self, status: LogStatus) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        match status {
            LogStatus::Completed => self.completed_at = Some(now),
            LogStatus::Failed => self.failed_at = Some(now),
            LogStatus::Pending | LogStatus::Running => {}
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.message.as_str())
    }
}
