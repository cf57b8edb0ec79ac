//! Drives a real `Scheduler` loop against `hybridclaw-storage`'s
//! SQLite-backed `TaskStore` impl, rather than the scheduler crate's own
//! `InMemoryTaskStore` fixture. Confirms a task written through the CLI's
//! storage layer actually fires when the loop runs, and that `last_run`
//! lands back in the same database row.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hybridclaw_core::TaskId;
use hybridclaw_scheduler::{Scheduler, SchedulerResult, Task, TaskRunner, TaskStore};
use hybridclaw_storage::Store;
use tokio::sync::watch;

struct CountingRunner(Arc<AtomicUsize>);

#[async_trait]
impl TaskRunner for CountingRunner {
    async fn run(&self, _task: &Task, _prompt: String) -> SchedulerResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn a_due_task_persisted_in_storage_fires_through_the_real_loop() {
    let store = Arc::new(Store::open_in_memory().unwrap());

    let id = store
        .add(Task {
            id: TaskId(0),
            prompt: "daily standup reminder".to_owned(),
            run_at: Some(Utc::now() + chrono::Duration::milliseconds(50)),
            every_ms: None,
            cron_expr: None,
            enabled: true,
            last_run: None,
        })
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let runner = Arc::new(CountingRunner(calls.clone()));
    let scheduler = Scheduler::new(store.clone(), runner);

    let (tx, rx) = watch::channel(false);
    let run_handle = tokio::spawn(async move { scheduler.run(rx).await });

    tokio::time::sleep(Duration::from_millis(400)).await;
    tx.send(true).unwrap();
    run_handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stored = store.get(id).await.unwrap();
    assert!(stored.last_run.is_some());
}

#[tokio::test]
async fn a_disabled_task_never_fires() {
    let store = Arc::new(Store::open_in_memory().unwrap());

    let id = store
        .add(Task {
            id: TaskId(0),
            prompt: "never runs".to_owned(),
            run_at: Some(Utc::now() + chrono::Duration::milliseconds(20)),
            every_ms: None,
            cron_expr: None,
            enabled: true,
            last_run: None,
        })
        .await
        .unwrap();
    store.set_enabled(id, false).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let runner = Arc::new(CountingRunner(calls.clone()));
    let scheduler = Scheduler::new(store, runner);

    let (tx, rx) = watch::channel(false);
    let run_handle = tokio::spawn(async move { scheduler.run(rx).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(true).unwrap();
    run_handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
