//! Task registry and ownership index.
//!
//! Both keep their own map-level lock, separate from the per-record lock in
//! [`TaskRecord`], so creating one task never waits on another task's worker.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::tasks::record::{OwnerId, TaskConfig, TaskId, TaskRecord};

/// Maps task ids to their records. Records are never removed.
#[derive(Default)]
pub struct Registry {
    records: RwLock<HashMap<TaskId, Arc<TaskRecord>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a `Queued` record under a fresh id, keeping at most
    /// `log_capacity` log lines.
    pub async fn create(
        &self,
        owner: OwnerId,
        config: TaskConfig,
        log_capacity: usize,
    ) -> Arc<TaskRecord> {
        let mut records = self.records.write().await;
        let mut id = TaskId::new();
        while records.contains_key(&id) {
            id = TaskId::new();
        }
        let record = Arc::new(TaskRecord::new(id, owner, config, log_capacity));
        records.insert(id, Arc::clone(&record));
        record
    }

    /// Look up a record.
    pub async fn get(&self, id: TaskId) -> Option<Arc<TaskRecord>> {
        self.records.read().await.get(&id).cloned()
    }

    /// All records, in no particular order.
    pub async fn records(&self) -> Vec<Arc<TaskRecord>> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[derive(Default)]
struct Ownership {
    by_owner: HashMap<OwnerId, Vec<TaskId>>,
    owner_of: HashMap<TaskId, OwnerId>,
}

/// Which owner may see which tasks.
#[derive(Default)]
pub struct OwnershipIndex {
    inner: RwLock<Ownership>,
}

impl OwnershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` may see `task`. Idempotent for the same owner;
    /// returns `false` if the task already belongs to someone else.
    pub async fn attach(&self, owner: &OwnerId, task: TaskId) -> bool {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.owner_of.get(&task) {
            return existing == owner;
        }
        inner.owner_of.insert(task, owner.clone());
        inner.by_owner.entry(owner.clone()).or_default().push(task);
        true
    }

    /// Every task attached to `owner`, in attachment order.
    pub async fn list_for(&self, owner: &OwnerId) -> Vec<TaskId> {
        self.inner
            .read()
            .await
            .by_owner
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_visible(&self, owner: &OwnerId, task: TaskId) -> bool {
        self.inner.read().await.owner_of.get(&task) == Some(owner)
    }
}
