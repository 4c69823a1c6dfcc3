//! Task controller: the operations external callers invoke.
//!
//! Every id-addressed operation first checks the ownership index. A task
//! owned by someone else yields the same `NotFound` as an unknown id.

use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::config::{RelayConfig, WorkerConfig, check_endpoint_template};
use crate::error::{self, TaskError};
use crate::tasks::record::{OwnerId, TaskConfig, TaskId, TaskRecord, TaskSnapshot, TaskSummary};
use crate::tasks::registry::{OwnershipIndex, Registry};
use crate::tasks::sender::{HttpSender, MessageSender};
use crate::tasks::state::TaskStatus;
use crate::tasks::worker::Worker;

/// Creates tasks and mediates all control-flag changes.
pub struct Controller {
    registry: Arc<Registry>,
    ownership: Arc<OwnershipIndex>,
    sender: Arc<dyn MessageSender>,
    config: WorkerConfig,
}

impl Controller {
    pub fn new(
        registry: Arc<Registry>,
        ownership: Arc<OwnershipIndex>,
        sender: Arc<dyn MessageSender>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            registry,
            ownership,
            sender,
            config,
        }
    }

    /// Controller with fresh, private registry and ownership index.
    pub fn standalone(sender: Arc<dyn MessageSender>, config: WorkerConfig) -> Self {
        Self::new(
            Arc::new(Registry::new()),
            Arc::new(OwnershipIndex::new()),
            sender,
            config,
        )
    }

    /// Controller that delivers over HTTP as described by `config`.
    pub fn from_config(config: &RelayConfig) -> error::Result<Self> {
        check_endpoint_template(&config.endpoint_template)?;
        let sender = HttpSender::new(config.endpoint_template.clone(), config.send_timeout)?;
        Ok(Self::standalone(Arc::new(sender), config.worker.clone()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Validate, register, attach to `owner` and start the worker.
    pub async fn create(&self, owner: &OwnerId, config: TaskConfig) -> Result<TaskId, TaskError> {
        config.validate()?;

        let record = self
            .registry
            .create(owner.clone(), config, self.config.log_capacity)
            .await;
        let id = record.id();
        self.ownership.attach(owner, id).await;

        Worker::new(
            Arc::clone(&record),
            Arc::clone(&self.sender),
            self.config.clone(),
        )
        .spawn();

        info!(
            task_id = %id,
            owner = %owner,
            messages = record.messages().len(),
            credentials = record.credentials().len(),
            interval_secs = record.interval_seconds(),
            "Task created"
        );
        Ok(id)
    }

    /// Resolve an id the caller is allowed to see. `Ok(None)` means visible
    /// but without a backing record.
    async fn visible(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> Result<Option<Arc<TaskRecord>>, TaskError> {
        if !self.ownership.is_visible(owner, id).await {
            return Err(TaskError::not_found(id));
        }
        Ok(self.registry.get(id).await)
    }

    pub async fn pause(&self, owner: &OwnerId, id: TaskId) -> Result<(), TaskError> {
        if let Some(record) = self.visible(owner, id).await? {
            if record.request_pause().await {
                info!(task_id = %id, "Task paused");
            }
        }
        Ok(())
    }

    /// No-op for a stopped task.
    pub async fn resume(&self, owner: &OwnerId, id: TaskId) -> Result<(), TaskError> {
        if let Some(record) = self.visible(owner, id).await? {
            if record.request_resume().await {
                info!(task_id = %id, "Task resumed");
            }
        }
        Ok(())
    }

    /// Ask the worker to stop. The `Stopped` status is set by the worker
    /// itself shortly after this returns.
    pub async fn stop(&self, owner: &OwnerId, id: TaskId) -> Result<(), TaskError> {
        if let Some(record) = self.visible(owner, id).await? {
            if record.request_stop().await {
                info!(task_id = %id, "Task stop requested");
            }
        }
        Ok(())
    }

    pub async fn inspect(&self, owner: &OwnerId, id: TaskId) -> Result<TaskSnapshot, TaskError> {
        Ok(match self.visible(owner, id).await? {
            Some(record) => record.snapshot().await,
            None => TaskSnapshot::absent(id),
        })
    }

    /// The caller's tasks in creation order.
    pub async fn list(&self, owner: &OwnerId) -> Vec<TaskSummary> {
        let ids = self.ownership.list_for(owner).await;
        join_all(ids.into_iter().map(|id| async move {
            match self.registry.get(id).await {
                Some(record) => record.summary().await,
                None => TaskSummary {
                    id,
                    status: TaskStatus::Stopped,
                    credential_count: 0,
                },
            }
        }))
        .await
    }

    /// Signal every task to stop. Returns how many were still running.
    pub async fn stop_all(&self) -> usize {
        let mut stopped = 0;
        for record in self.registry.records().await {
            if record.request_stop().await {
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!(count = stopped, "Stop requested for all tasks");
        }
        stopped
    }
}
