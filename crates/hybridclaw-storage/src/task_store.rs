//! [`TaskStore`] backed by the `tasks` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hybridclaw_core::TaskId;
use hybridclaw_scheduler::{SchedulerError, SchedulerResult, Task, TaskStore};
use rusqlite::{Row, params};

use crate::store::Store;

fn to_scheduler_error(e: crate::error::StorageError) -> SchedulerError {
    SchedulerError::Storage(e.to_string())
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId(row.get(0)?),
        prompt: row.get(1)?,
        run_at: row
            .get::<_, Option<String>>(2)?
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
        every_ms: row.get(3)?,
        cron_expr: row.get(4)?,
        enabled: row.get(5)?,
        last_run: row
            .get::<_, Option<String>>(6)?
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
    })
}

#[async_trait]
impl TaskStore for Store {
    async fn list(&self) -> SchedulerResult<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, prompt, run_at, every_ms, cron_expr, enabled, last_run FROM tasks",
            )?;
            let rows = stmt.query_map([], row_to_task)?;
            rows.collect()
        })
        .await
        .map_err(to_scheduler_error)
    }

    async fn get(&self, id: TaskId) -> SchedulerResult<Task> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, prompt, run_at, every_ms, cron_expr, enabled, last_run \
                 FROM tasks WHERE id = ?1",
                params![id.0],
                row_to_task,
            )
        })
        .await
        .map_err(|e| match e {
            crate::error::StorageError::Database(rusqlite::Error::QueryReturnedNoRows) => {
                SchedulerError::TaskNotFound(id)
            }
            other => to_scheduler_error(other),
        })
    }

    async fn add(&self, task: Task) -> SchedulerResult<TaskId> {
        // `Task` carries no session/channel association: cron-originated
        // tasks aren't tied to a conversation the way chat messages are.
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO tasks (session_id, channel_id, prompt, cron_expr, run_at, every_ms, \
                 enabled, last_run, created_at) \
                 VALUES (NULL, NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.prompt,
                    task.cron_expr,
                    task.run_at.map(|t| t.to_rfc3339()),
                    task.every_ms,
                    task.enabled,
                    task.last_run.map(|t| t.to_rfc3339()),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(TaskId(conn.last_insert_rowid()))
        })
        .await
        .map_err(to_scheduler_error)
    }

    async fn remove(&self, id: TaskId) -> SchedulerResult<()> {
        let changed = self
            .with_conn(move |conn| Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.0])?))
            .await
            .map_err(to_scheduler_error)?;
        if changed == 0 {
            return Err(SchedulerError::TaskNotFound(id));
        }
        Ok(())
    }

    async fn set_enabled(&self, id: TaskId, enabled: bool) -> SchedulerResult<()> {
        let changed = self
            .with_conn(move |conn| {
                Ok(conn.execute(
                    "UPDATE tasks SET enabled = ?1 WHERE id = ?2",
                    params![enabled, id.0],
                )?)
            })
            .await
            .map_err(to_scheduler_error)?;
        if changed == 0 {
            return Err(SchedulerError::TaskNotFound(id));
        }
        Ok(())
    }

    async fn stamp_last_run(&self, id: TaskId, at: DateTime<Utc>) -> SchedulerResult<()> {
        let changed = self
            .with_conn(move |conn| {
                Ok(conn.execute(
                    "UPDATE tasks SET last_run = ?1 WHERE id = ?2",
                    params![at.to_rfc3339(), id.0],
                )?)
            })
            .await
            .map_err(to_scheduler_error)?;
        if changed == 0 {
            return Err(SchedulerError::TaskNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn sample_task() -> Task {
        Task {
            id: TaskId(0),
            prompt: "ping".to_owned(),
            run_at: None,
            every_ms: Some(60_000),
            cron_expr: None,
            enabled: true,
            last_run: None,
        }
    }

    #[tokio::test]
    async fn add_list_and_get_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let id = store.add(sample_task()).await.unwrap();

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks.len(), 1);

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.every_ms, Some(60_000));
    }

    #[tokio::test]
    async fn get_missing_task_errors() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.get(TaskId(99)).await, Err(SchedulerError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn remove_missing_task_errors() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.remove(TaskId(99)).await, Err(SchedulerError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn set_enabled_and_stamp_last_run_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let id = store.add(sample_task()).await.unwrap();
        store.set_enabled(id, false).await.unwrap();
        let now = Utc::now();
        store.stamp_last_run(id, now).await.unwrap();

        let task = store.get(id).await.unwrap();
        assert!(!task.enabled);
        assert_eq!(task.last_run.unwrap().timestamp(), now.timestamp());
    }
}
