//! The armed-timer scheduler loop: sleeps until the earliest task's next
//! fire, ticks, and re-arms. A creation, deletion, or toggle interrupts the
//! sleep early via [`Scheduler::rearm`].

use std::sync::Arc;

use chrono::Utc;
use hybridclaw_core::TaskId;
use tokio::sync::{watch, Notify};

use crate::arm::compute_arm;
use crate::error::SchedulerResult;
use crate::runner::TaskRunner;
use crate::store::TaskStore;
use crate::tick::tick;
use crate::types::Task;

/// Owns the single armed timer and the task store/runner it drives.
pub struct Scheduler {
    store: Arc<dyn TaskStore>,
    runner: Arc<dyn TaskRunner>,
    rearm_notify: Notify,
}

impl Scheduler {
    /// Build a scheduler over `store`, dispatching fires through `runner`.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>, runner: Arc<dyn TaskRunner>) -> Self {
        Self {
            store,
            runner,
            rearm_notify: Notify::new(),
        }
    }

    /// Wake the run loop to recompute the armed timer immediately, e.g.
    /// after a task is created, removed, or toggled.
    pub fn rearm(&self) {
        self.rearm_notify.notify_one();
    }

    /// Add a task and re-arm.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn add_task(&self, task: Task) -> SchedulerResult<TaskId> {
        let id = self.store.add(task).await?;
        self.rearm();
        Ok(id)
    }

    /// Remove a task and re-arm.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn remove_task(&self, id: TaskId) -> SchedulerResult<()> {
        self.store.remove(id).await?;
        self.rearm();
        Ok(())
    }

    /// Enable or disable a task and re-arm.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn set_enabled(&self, id: TaskId, enabled: bool) -> SchedulerResult<()> {
        self.store.set_enabled(id, enabled).await?;
        self.rearm();
        Ok(())
    }

    /// List all tasks.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn list_tasks(&self) -> SchedulerResult<Vec<Task>> {
        self.store.list().await
    }

    /// Run the arm/sleep/tick loop until `shutdown` broadcasts `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("scheduler started");
        loop {
            let tasks = match self.store.list().await {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::error!(error = %e, "failed to list tasks while arming");
                    Vec::new()
                }
            };

            let armed = compute_arm(&tasks, Utc::now());

            match armed {
                None => {
                    tokio::select! {
                        () = self.rearm_notify.notified() => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                Some(duration) => {
                    tokio::select! {
                        () = tokio::time::sleep(duration) => {
                            tick(self.store.as_ref(), self.runner.as_ref(), Utc::now()).await;
                        }
                        () = self.rearm_notify.notified() => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
            }
        }
        tracing::info!("scheduler shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerResult as Result;
    use crate::store::InMemoryTaskStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingRunner(Arc<AtomicUsize>);

    #[async_trait]
    impl TaskRunner for CountingRunner {
        async fn run(&self, _task: &Task, _prompt: String) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_at_task_fires_once_the_loop_reaches_its_deadline() {
        let store = Arc::new(InMemoryTaskStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = Arc::new(CountingRunner(calls.clone()));
        let scheduler = Scheduler::new(store, runner);

        scheduler
            .add_task(Task {
                id: TaskId(0),
                prompt: "p".to_owned(),
                run_at: Some(Utc::now() + chrono::Duration::milliseconds(50)),
                every_ms: None,
                cron_expr: None,
                enabled: true,
                last_run: None,
            })
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let run_handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(true).unwrap();
        run_handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_an_unarmed_loop() {
        let store = Arc::new(InMemoryTaskStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = Arc::new(CountingRunner(calls));
        let scheduler = Arc::new(Scheduler::new(store, runner));

        let (tx, rx) = watch::channel(false);
        let loop_scheduler = scheduler.clone();
        let run_handle = tokio::spawn(async move { loop_scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), run_handle)
            .await
            .expect("loop should exit promptly on shutdown")
            .unwrap();
    }
}
