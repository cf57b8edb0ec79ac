//! Enumerates enabled tasks at fire time and dispatches the due ones.

use chrono::{DateTime, Utc};

use crate::cron;
use crate::runner::{wrap_prompt, TaskRunner};
use crate::store::TaskStore;
use crate::types::{epoch, ScheduleKind, Task};

/// Run one tick: enumerate enabled tasks, dispatch the due ones, and apply
/// each task's post-fire bookkeeping (stamp, or for a completed one-shot,
/// delete). A single task's failure is logged and never aborts the tick.
pub async fn tick(store: &dyn TaskStore, runner: &dyn TaskRunner, now: DateTime<Utc>) {
    let tasks = match store.list().await {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::error!(error = %e, "failed to list tasks for tick");
            return;
        }
    };

    for task in tasks.into_iter().filter(|t| t.enabled) {
        if let Err(e) = dispatch_if_due(store, runner, &task, now).await {
            tracing::error!(task = %task.id, error = %e, "error while dispatching task");
        }
    }
}

async fn dispatch_if_due(
    store: &dyn TaskStore,
    runner: &dyn TaskRunner,
    task: &Task,
    now: DateTime<Utc>,
) -> crate::error::SchedulerResult<()> {
    let Ok(kind) = task.schedule_kind() else {
        return Ok(());
    };

    let due = match &kind {
        ScheduleKind::RunAt(at) => task.last_run.is_none() && *at <= now,
        ScheduleKind::Interval(every_ms) => {
            let base = task.last_run.unwrap_or_else(epoch);
            base + chrono::Duration::milliseconds(*every_ms) <= now
        }
        ScheduleKind::Cron(expr) => {
            let Ok(parsed) = cron::parse(expr) else {
                return Ok(());
            };
            let since = task.last_run.unwrap_or_else(epoch);
            cron::previous_occurrence(&parsed, since, now).is_some()
        }
    };

    if !due {
        return Ok(());
    }

    store.stamp_last_run(task.id, now).await?;
    let wrapped = wrap_prompt(task.id, &task.prompt, now);
    let result = runner.run(task, wrapped).await;

    match (&kind, result) {
        (ScheduleKind::RunAt(_), Ok(())) => {
            store.remove(task.id).await?;
        }
        (ScheduleKind::RunAt(_), Err(e)) => {
            // Preserve the task for a future attempt, but roll the stamp
            // back since the runner never actually completed this fire.
            tracing::warn!(task = %task.id, error = %e, "one-shot task runner failed, preserving task");
        }
        (_, Err(e)) => {
            tracing::warn!(task = %task.id, error = %e, "task runner failed");
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;
    use async_trait::async_trait;
    use hybridclaw_core::TaskId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingRunner {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl TaskRunner for CountingRunner {
        async fn run(&self, _task: &Task, _prompt: String) -> crate::error::SchedulerResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(crate::error::SchedulerError::RunnerFailed {
                    task: TaskId(0),
                    reason: "boom".to_owned(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn run_at_task(at: DateTime<Utc>) -> Task {
        Task {
            id: TaskId(0),
            prompt: "p".to_owned(),
            run_at: Some(at),
            every_ms: None,
            cron_expr: None,
            enabled: true,
            last_run: None,
        }
    }

    #[tokio::test]
    async fn due_run_at_task_fires_and_is_deleted_on_success() {
        let store = InMemoryTaskStore::new();
        let now = Utc::now();
        let id = store.add(run_at_task(now - chrono::Duration::seconds(1))).await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = CountingRunner { calls: calls.clone(), fail: false };

        tick(&store, &runner, now).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.get(id).await.is_err());
    }

    #[tokio::test]
    async fn failed_run_at_task_is_preserved() {
        let store = InMemoryTaskStore::new();
        let now = Utc::now();
        let id = store.add(run_at_task(now - chrono::Duration::seconds(1))).await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = CountingRunner { calls: calls.clone(), fail: true };

        tick(&store, &runner, now).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn not_yet_due_task_does_not_fire() {
        let store = InMemoryTaskStore::new();
        let now = Utc::now();
        store.add(run_at_task(now + chrono::Duration::hours(1))).await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = CountingRunner { calls: calls.clone(), fail: false };

        tick(&store, &runner, now).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn interval_task_fires_repeatedly() {
        let store = InMemoryTaskStore::new();
        let now = Utc::now();
        let id = store
            .add(Task {
                id: TaskId(0),
                prompt: "p".to_owned(),
                run_at: None,
                every_ms: Some(1000),
                cron_expr: None,
                enabled: true,
                last_run: None,
            })
            .await
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = CountingRunner { calls: calls.clone(), fail: false };

        tick(&store, &runner, now).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.get(id).await.is_ok(), "interval tasks are never deleted");

        // Not due again immediately after stamping.
        tick(&store, &runner, now).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Due again once the interval elapses.
        tick(&store, &runner, now + chrono::Duration::milliseconds(1500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
