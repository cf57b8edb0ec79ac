//! Storage abstraction for tasks. A durable implementation lives in the
//! database store (C2); `InMemoryTaskStore` backs tests and anywhere a
//! full database isn't wired up yet.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hybridclaw_core::TaskId;

use crate::error::{SchedulerError, SchedulerResult};
use crate::types::Task;

/// CRUD and fire-bookkeeping operations the scheduler needs against the
/// task table, independent of the backing store.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, enabled or not.
    async fn list(&self) -> SchedulerResult<Vec<Task>>;

    /// A single task by id.
    async fn get(&self, id: TaskId) -> SchedulerResult<Task>;

    /// Insert a new task, returning its assigned id.
    async fn add(&self, task: Task) -> SchedulerResult<TaskId>;

    /// Remove a task.
    async fn remove(&self, id: TaskId) -> SchedulerResult<()>;

    /// Flip a task's `enabled` flag.
    async fn set_enabled(&self, id: TaskId, enabled: bool) -> SchedulerResult<()>;

    /// Stamp a task's `last_run` after it successfully dispatched.
    async fn stamp_last_run(&self, id: TaskId, at: DateTime<Utc>) -> SchedulerResult<()>;
}

/// In-memory [`TaskStore`], guarded by a `Mutex` since task mutations are
/// infrequent and always originate from a single tick or a CLI command.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    next_id: Mutex<i64>,
}

impl InMemoryTaskStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self) -> SchedulerResult<Vec<Task>> {
        Ok(self.tasks.lock().expect("lock poisoned").values().cloned().collect())
    }

    async fn get(&self, id: TaskId) -> SchedulerResult<Task> {
        self.tasks
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::TaskNotFound(id))
    }

    async fn add(&self, mut task: Task) -> SchedulerResult<TaskId> {
        let mut next_id = self.next_id.lock().expect("lock poisoned");
        *next_id += 1;
        let id = TaskId(*next_id);
        task.id = id;
        self.tasks.lock().expect("lock poisoned").insert(id, task);
        Ok(id)
    }

    async fn remove(&self, id: TaskId) -> SchedulerResult<()> {
        self.tasks
            .lock()
            .expect("lock poisoned")
            .remove(&id)
            .map(|_| ())
            .ok_or(SchedulerError::TaskNotFound(id))
    }

    async fn set_enabled(&self, id: TaskId, enabled: bool) -> SchedulerResult<()> {
        let mut tasks = self.tasks.lock().expect("lock poisoned");
        let task = tasks.get_mut(&id).ok_or(SchedulerError::TaskNotFound(id))?;
        task.enabled = enabled;
        Ok(())
    }

    async fn stamp_last_run(&self, id: TaskId, at: DateTime<Utc>) -> SchedulerResult<()> {
        let mut tasks = self.tasks.lock().expect("lock poisoned");
        let task = tasks.get_mut(&id).ok_or(SchedulerError::TaskNotFound(id))?;
        task.last_run = Some(at);
        Ok(())
    }
}
