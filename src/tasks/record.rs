//! Task record: immutable configuration plus lock-guarded live fields.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::error::TaskError;
use crate::tasks::state::TaskStatus;

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque identity of the caller that created a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration supplied when creating a task.
#[derive(Debug)]
pub struct TaskConfig {
    /// Destination of every send (e.g. a conversation id).
    pub target: String,
    /// Prepended to each message, separated by a space.
    pub label_prefix: String,
    pub messages: Vec<String>,
    pub credentials: Vec<SecretString>,
    pub interval_seconds: u64,
}

impl TaskConfig {
    /// Check required fields, naming the first one that is missing or invalid.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.target.trim().is_empty() {
            return Err(TaskError::Validation { field: "target" });
        }
        if self.messages.is_empty() {
            return Err(TaskError::Validation { field: "messages" });
        }
        if self.credentials.is_empty() {
            return Err(TaskError::Validation {
                field: "credentials",
            });
        }
        if self.interval_seconds < 1 {
            return Err(TaskError::Validation {
                field: "interval_seconds",
            });
        }
        Ok(())
    }
}

/// One timestamped line of a task log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

/// Fields written by more than one actor. Only reachable through the
/// record's mutex.
#[derive(Debug)]
pub(crate) struct LiveState {
    pub(crate) status: TaskStatus,
    pub(crate) running: bool,
    pub(crate) paused: bool,
    pub(crate) cursor: u64,
    log: VecDeque<LogEntry>,
    log_capacity: usize,
}

impl LiveState {
    fn new(log_capacity: usize) -> Self {
        Self {
            status: TaskStatus::Queued,
            running: true,
            paused: false,
            cursor: 0,
            log: VecDeque::new(),
            log_capacity,
        }
    }

    /// Append a log line, dropping the oldest entries past capacity.
    pub(crate) fn push_log(&mut self, message: impl Into<String>) {
        self.log.push_back(LogEntry::now(message));
        if self.log_capacity > 0 {
            while self.log.len() > self.log_capacity {
                self.log.pop_front();
            }
        }
    }
}

/// Point-in-time view of a task for detail pages.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub status: TaskStatus,
    pub credential_count: usize,
    pub message_count: usize,
    pub interval_seconds: u64,
    pub target: String,
    pub label_prefix: String,
    pub cursor: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub log: Vec<LogEntry>,
    /// `log` rendered as `[YYYY-MM-DD HH:MM:SS] message`, oldest first.
    pub lines: Vec<String>,
}

impl TaskSnapshot {
    /// View of a visible id with no backing record.
    pub fn absent(id: TaskId) -> Self {
        Self {
            id,
            status: TaskStatus::Stopped,
            credential_count: 0,
            message_count: 0,
            interval_seconds: 0,
            target: String::new(),
            label_prefix: String::new(),
            cursor: 0,
            created_at: None,
            log: Vec::new(),
            lines: Vec::new(),
        }
    }
}

/// Row of a task listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub status: TaskStatus,
    pub credential_count: usize,
}

/// A single relay task.
#[derive(Debug)]
pub struct TaskRecord {
    id: TaskId,
    owner: OwnerId,
    target: String,
    label_prefix: String,
    messages: Vec<String>,
    credentials: Vec<SecretString>,
    interval_seconds: u64,
    created_at: DateTime<Utc>,
    state: Mutex<LiveState>,
    wake: Notify,
    worker_claimed: AtomicBool,
}

impl TaskRecord {
    pub fn new(id: TaskId, owner: OwnerId, config: TaskConfig, log_capacity: usize) -> Self {
        Self {
            id,
            owner,
            target: config.target,
            label_prefix: config.label_prefix,
            messages: config.messages,
            credentials: config.credentials,
            interval_seconds: config.interval_seconds.max(1),
            created_at: Utc::now(),
            state: Mutex::new(LiveState::new(log_capacity)),
            wake: Notify::new(),
            worker_claimed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn credentials(&self) -> &[SecretString] {
        &self.credentials
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reserve this record for a worker. Returns `false` if one already holds it.
    pub fn claim_worker(&self) -> bool {
        !self.worker_claimed.swap(true, Ordering::SeqCst)
    }

    /// Run `f` with exclusive access to the live fields.
    pub(crate) async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut LiveState) -> R,
    {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    /// Current status.
    pub async fn status(&self) -> TaskStatus {
        self.state.lock().await.status
    }

    /// Current cursor.
    pub async fn cursor(&self) -> u64 {
        self.state.lock().await.cursor
    }

    /// Whether the worker has been told to keep going.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Whether sends are held off.
    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused
    }

    /// Set the pause flag. Returns `true` if anything changed.
    pub async fn request_pause(&self) -> bool {
        let changed = self
            .update(|s| {
                if !s.running || s.paused || !s.status.can_transition_to(TaskStatus::Paused) {
                    return false;
                }
                s.paused = true;
                s.status = TaskStatus::Paused;
                s.push_log("Paused by user");
                true
            })
            .await;
        if changed {
            self.wake.notify_one();
        }
        changed
    }

    /// Clear the pause flag. Returns `true` if anything changed.
    pub async fn request_resume(&self) -> bool {
        let changed = self
            .update(|s| {
                if !s.running || !s.paused || !s.status.can_transition_to(TaskStatus::Running) {
                    return false;
                }
                s.paused = false;
                s.status = TaskStatus::Running;
                s.push_log("Resumed by user");
                true
            })
            .await;
        if changed {
            self.wake.notify_one();
        }
        changed
    }

    /// Clear the running flag. The worker's finalizer sets `Stopped`.
    /// Returns `true` if anything changed.
    pub async fn request_stop(&self) -> bool {
        let changed = self
            .update(|s| {
                if s.status.is_terminal() || !s.running {
                    return false;
                }
                s.running = false;
                s.push_log("Stopped by user");
                true
            })
            .await;
        if changed {
            self.wake.notify_one();
        }
        changed
    }

    /// Sleep for one tick, returning early if a control call arrives.
    pub(crate) async fn wait_tick(&self, tick: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(tick) => {}
            _ = self.wake.notified() => {}
        }
    }

    /// Consistent copy of everything a detail view shows.
    pub async fn snapshot(&self) -> TaskSnapshot {
        let state = self.state.lock().await;
        TaskSnapshot {
            id: self.id,
            status: state.status,
            credential_count: self.credentials.len(),
            message_count: self.messages.len(),
            interval_seconds: self.interval_seconds,
            target: self.target.clone(),
            label_prefix: self.label_prefix.clone(),
            cursor: state.cursor,
            created_at: Some(self.created_at),
            log: state.log.iter().cloned().collect(),
            lines: state.log.iter().map(ToString::to_string).collect(),
        }
    }

    /// Listing row.
    pub async fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            status: self.status().await,
            credential_count: self.credentials.len(),
        }
    }
}
