//! Scheduled-task administration: add, list, remove, toggle.
//!
//! Operates directly on the `tasks` table through [`TaskStore`]; the
//! scheduler process picks up changes the next time it re-arms.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use hybridclaw_core::TaskId;
use hybridclaw_scheduler::{Task, TaskStore};
use hybridclaw_storage::Store;

use crate::theme::Theme;

/// Minimum accepted `--every` interval, matching the 10 second floor the
/// scheduler itself enforces.
const MIN_EVERY_MS: u64 = 10_000;

/// How a task's fire time was specified on the command line.
pub(crate) enum ScheduleSpec {
    /// Recurring cron expression.
    Cron(String),
    /// Fixed interval, in seconds.
    Every(u64),
    /// One-shot RFC 3339 timestamp.
    At(String),
}

/// Add a new scheduled task.
///
/// # Errors
///
/// Returns an error if `--every` is below the 10 second floor, `--at`
/// isn't a valid RFC 3339 timestamp, or the insert fails.
pub(crate) async fn add_task(store: &Store, spec: ScheduleSpec, prompt: String) -> Result<()> {
    let (cron_expr, run_at, every_ms) = match spec {
        ScheduleSpec::Cron(expr) => (Some(expr), None, None),
        ScheduleSpec::Every(secs) => {
            let every_ms = secs.saturating_mul(1_000);
            if every_ms < MIN_EVERY_MS {
                bail!("--every must be at least 10 seconds");
            }
            (None, None, Some(every_ms))
        }
        ScheduleSpec::At(iso) => {
            let at: DateTime<Utc> = DateTime::parse_from_rfc3339(&iso)
                .with_context(|| format!("{iso} is not a valid RFC 3339 timestamp"))?
                .with_timezone(&Utc);
            (None, Some(at), None)
        }
    };

    let task = Task {
        id: TaskId(0),
        prompt,
        run_at,
        every_ms,
        cron_expr,
        enabled: true,
        last_run: None,
    };
    let id = store.add(task).await?;
    println!("{}", Theme::success(&format!("scheduled task {id}")));
    Ok(())
}

/// List every scheduled task.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn list_tasks(store: &Store) -> Result<()> {
    let tasks = store.list().await?;
    if tasks.is_empty() {
        println!("{}", Theme::info("no scheduled tasks"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Scheduled Tasks"));
    println!("{}", Theme::separator());
    for task in tasks {
        let schedule = describe_schedule(&task);
        let state = if task.enabled { "enabled" } else { "disabled" };
        println!("[{}] {state:<8} {schedule:<28} {}", task.id, task.prompt);
    }
    println!();
    Ok(())
}

/// Remove a scheduled task by id.
///
/// # Errors
///
/// Returns an error if no such task exists.
pub(crate) async fn remove_task(store: &Store, id: i64) -> Result<()> {
    store.remove(TaskId(id)).await?;
    println!("{}", Theme::success(&format!("removed task {id}")));
    Ok(())
}

/// Flip a scheduled task's enabled flag.
///
/// # Errors
///
/// Returns an error if no such task exists.
pub(crate) async fn toggle_task(store: &Store, id: i64) -> Result<()> {
    let task = store.get(TaskId(id)).await?;
    let enabled = !task.enabled;
    store.set_enabled(TaskId(id), enabled).await?;
    let state = if enabled { "enabled" } else { "disabled" };
    println!("{}", Theme::success(&format!("task {id} {state}")));
    Ok(())
}

fn describe_schedule(task: &Task) -> String {
    if let Some(expr) = &task.cron_expr {
        format!("cron {expr}")
    } else if let Some(every_ms) = task.every_ms {
        format!("every {}s", every_ms / 1_000)
    } else if let Some(run_at) = task.run_at {
        format!("at {}", run_at.to_rfc3339())
    } else {
        "unscheduled".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_task_rejects_intervals_under_ten_seconds() {
        let store = Store::open_in_memory().unwrap();
        let result = add_task(&store, ScheduleSpec::Every(5), "ping".to_owned()).await;
        assert!(result.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_task_rejects_an_invalid_timestamp() {
        let store = Store::open_in_memory().unwrap();
        let result = add_task(&store, ScheduleSpec::At("not-a-date".to_owned()), "ping".to_owned()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_list_remove_and_toggle_round_trip() {
        let store = Store::open_in_memory().unwrap();
        add_task(&store, ScheduleSpec::Every(60), "stand up".to_owned()).await.unwrap();

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks.len(), 1);
        let id = tasks[0].id.0;
        assert!(tasks[0].enabled);

        toggle_task(&store, id).await.unwrap();
        assert!(!store.get(TaskId(id)).await.unwrap().enabled);

        remove_task(&store, id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_missing_task_surfaces_the_store_error() {
        let store = Store::open_in_memory().unwrap();
        assert!(remove_task(&store, 99).await.is_err());
    }

    #[tokio::test]
    async fn add_task_with_a_cron_expression_carries_it_through() {
        let store = Store::open_in_memory().unwrap();
        add_task(&store, ScheduleSpec::Cron("0 9 * * *".to_owned()), "good morning".to_owned()).await.unwrap();

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks[0].cron_expr.as_deref(), Some("0 9 * * *"));
    }
}
