//! Per-task send loop.
//!
//! Each task gets exactly one worker. The worker body runs as its own tokio
//! task; an outer task awaits it and always runs the finalizer, so a task
//! reaches `Stopped` even if the body panics.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::tasks::record::TaskRecord;
use crate::tasks::sender::MessageSender;
use crate::tasks::state::TaskStatus;

/// What the loop does after a send attempt.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Paused or stopped since the last flag check; nothing was sent.
    Held,
    Exhausted,
}

/// Drives one task's send loop.
pub struct Worker {
    record: Arc<TaskRecord>,
    sender: Arc<dyn MessageSender>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        record: Arc<TaskRecord>,
        sender: Arc<dyn MessageSender>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            record,
            sender,
            config,
        }
    }

    /// Start the loop in the background. Returns `None` if the record
    /// already has a worker.
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if !self.record.claim_worker() {
            warn!(task_id = %self.record.id(), "Task already has a worker; not spawning another");
            return None;
        }

        let record = Arc::clone(&self.record);
        Some(tokio::spawn(async move {
            let task_id = record.id();
            let body = tokio::spawn(self.run());
            if let Err(e) = body.await {
                error!(task_id = %task_id, error = %e, "Worker loop panicked");
            }
            finalize(&record).await;
        }))
    }

    async fn run(self) {
        self.start().await;

        loop {
            let (running, paused) = self.flags().await;
            if !running {
                break;
            }
            if paused {
                self.record.wait_tick(self.config.tick).await;
                continue;
            }

            match self.attempt().await {
                Flow::Continue => {}
                Flow::Held => continue,
                Flow::Exhausted => break,
            }

            self.wait_interval().await;
        }
    }

    async fn start(&self) {
        self.record
            .update(|s| {
                if s.running && s.status == TaskStatus::Queued {
                    s.status = if s.paused {
                        TaskStatus::Paused
                    } else {
                        TaskStatus::Running
                    };
                }
                s.push_log("Worker started");
            })
            .await;
        info!(
            task_id = %self.record.id(),
            owner = %self.record.owner(),
            interval_secs = self.record.interval_seconds(),
            "Worker started"
        );
    }

    async fn flags(&self) -> (bool, bool) {
        self.record.update(|s| (s.running, s.paused)).await
    }

    /// Send the message/credential pair selected by the cursor and record
    /// the outcome. The cursor advances once per attempt.
    async fn attempt(&self) -> Flow {
        let record = &self.record;
        let messages = record.messages();
        let credentials = record.credentials();

        if messages.is_empty() || credentials.is_empty() {
            record
                .update(|s| {
                    s.push_log("No credentials or messages; stopping");
                    s.running = false;
                })
                .await;
            warn!(task_id = %record.id(), "Task has nothing to send; stopping");
            return Flow::Exhausted;
        }

        // Flags and cursor are read together so a pause that lands after the
        // loop's flag check still prevents this send.
        let cursor = match record
            .update(|s| (s.running && !s.paused).then_some(s.cursor))
            .await
        {
            Some(cursor) => cursor,
            None => return Flow::Held,
        };
        let msg_idx = (cursor % messages.len() as u64) as usize;
        let token_idx = (cursor % credentials.len() as u64) as usize;

        let payload = format!("{} {}", record.label_prefix(), messages[msg_idx]);

        let result = self
            .sender
            .send(record.target(), &credentials[token_idx], &payload)
            .await;

        let line = match &result {
            Ok(()) => format!("Sent (msg #{}) using token #{}", msg_idx + 1, token_idx + 1),
            Err(e) => format!(
                "Failed (msg #{}) using token #{}: {e}",
                msg_idx + 1,
                token_idx + 1
            ),
        };
        record
            .update(|s| {
                s.push_log(line);
                s.cursor += 1;
            })
            .await;

        match result {
            Ok(()) => debug!(task_id = %record.id(), cursor, "Message sent"),
            Err(e) => warn!(task_id = %record.id(), cursor, error = %e, "Send failed"),
        }

        Flow::Continue
    }

    /// Wait out the interval one tick at a time. Returns early on stop or
    /// pause; a pause abandons the rest of the interval.
    async fn wait_interval(&self) {
        let tick = self.config.tick;
        let units = u32::try_from(self.record.interval_seconds()).unwrap_or(u32::MAX);
        let deadline = Instant::now() + ticks(&self.config, units);

        loop {
            let (running, paused) = self.flags().await;
            if !running || paused {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            self.record.wait_tick(tick.min(deadline - now)).await;
        }
    }
}

/// Reset flags and mark the task stopped. Runs once per worker.
async fn finalize(record: &TaskRecord) {
    record
        .update(|s| {
            s.running = false;
            s.paused = false;
            s.status = TaskStatus::Stopped;
            s.push_log("Worker stopped");
        })
        .await;
    info!(task_id = %record.id(), "Worker stopped");
}

/// Duration of `units` ticks.
pub fn ticks(config: &WorkerConfig, units: u32) -> Duration {
    config.tick.saturating_mul(units)
}
