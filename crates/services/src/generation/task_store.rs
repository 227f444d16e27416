use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use logoforge_db::models::{LogoTask, TaskResult, TaskStatus};

use crate::dao::base::{DaoError, DaoResult};

/// Persistence seam for generation tasks.
///
/// Every mutation goes through [`TaskStore::transition`], a compare-and-set on
/// the current status, so the worker and the read-path reconciliation can race
/// on the same row without clobbering each other.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &LogoTask) -> DaoResult<()>;

    /// Lookup scoped by owner. A foreign task is reported as absent.
    async fn find_owned(&self, id: &str, owner_id: &str) -> DaoResult<Option<LogoTask>>;

    async fn find(&self, id: &str) -> DaoResult<Option<LogoTask>>;

    /// Moves the task from `from` to `to` only if its status is still `from`.
    /// Returns `false` when the row is missing or its status has moved on.
    async fn transition(
        &self,
        id: &str,
        from: TaskStatus,
        to: TaskStatus,
        result: Option<TaskResult>,
        now: DateTime<Utc>,
    ) -> DaoResult<bool>;

    /// Tasks in any of `statuses`, oldest first.
    async fn find_by_status(&self, statuses: &[TaskStatus]) -> DaoResult<Vec<LogoTask>>;
}

pub(crate) fn check_transition(from: TaskStatus, to: TaskStatus) -> DaoResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DaoError::Validation(format!(
            "invalid status transition {from} -> {to}"
        )))
    }
}

/// In-process task store. Used by tests and single-node development setups.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: DashMap<String, LogoTask>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a task as-is, bypassing transition checks. Test fixtures use
    /// this to plant rows with arbitrary ages and states.
    pub fn put(&self, task: LogoTask) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: &LogoTask) -> DaoResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.tasks.entry(task.id.clone()) {
            Entry::Occupied(_) => Err(DaoError::DuplicateKey(task.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                Ok(())
            }
        }
    }

    async fn find_owned(&self, id: &str, owner_id: &str) -> DaoResult<Option<LogoTask>> {
        Ok(self
            .tasks
            .get(id)
            .filter(|task| task.owner_id == owner_id)
            .map(|task| task.clone()))
    }

    async fn find(&self, id: &str) -> DaoResult<Option<LogoTask>> {
        Ok(self.tasks.get(id).map(|task| task.clone()))
    }

    async fn transition(
        &self,
        id: &str,
        from: TaskStatus,
        to: TaskStatus,
        result: Option<TaskResult>,
        now: DateTime<Utc>,
    ) -> DaoResult<bool> {
        check_transition(from, to)?;

        // The entry guard holds the shard lock for the whole read-modify-write
        let Some(mut task) = self.tasks.get_mut(id) else {
            return Ok(false);
        };
        if task.status != from {
            return Ok(false);
        }
        task.status = to;
        if result.is_some() {
            task.result = result;
        }
        task.updated_at = now;
        Ok(true)
    }

    async fn find_by_status(&self, statuses: &[TaskStatus]) -> DaoResult<Vec<LogoTask>> {
        let mut tasks: Vec<LogoTask> = self
            .tasks
            .iter()
            .filter(|task| statuses.contains(&task.status))
            .map(|task| task.clone())
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        Ok(tasks)
    }
}
