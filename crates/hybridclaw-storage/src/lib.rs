#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Embedded relational store for sessions, messages, scheduled tasks,
//! structured audit, and tool-call approvals.
//!
//! [`Store`] wraps a single WAL-mode SQLite connection behind
//! `spawn_blocking`, owns schema creation and additive migration, and
//! exposes CRUD for every entity plus the five named cross-cutting
//! queries. It also implements [`hybridclaw_scheduler::TaskStore`] and
//! [`hybridclaw_compaction::SessionStore`] directly, so the scheduler and
//! compaction crates never need to know a database exists.

mod error;
mod schema;
mod session_store;
mod store;
mod task_store;
mod types;

pub use error::{StorageError, StorageResult};
pub use store::Store;
pub use types::{
    ApprovalAuditEntry, NewMessage, NewSession, Session, StoredMessage, StructuredAuditRow,
};

#[cfg(test)]
mod tests {
    use super::*;
    use hybridclaw_compaction::SessionStore;
    use hybridclaw_scheduler::{Task, TaskStore};
    use hybridclaw_core::TaskId;

    #[tokio::test]
    async fn store_satisfies_both_external_trait_contracts() {
        let store = Store::open_in_memory().unwrap();
        store
            .create_session(NewSession {
                id: "s1".to_owned(),
                guild_id: None,
                channel_id: "c1".to_owned(),
                bot_id: "bot".to_owned(),
            })
            .await
            .unwrap();

        let task_id = store
            .add(Task {
                id: TaskId(0),
                prompt: "ping".to_owned(),
                run_at: None,
                every_ms: Some(60_000),
                cron_expr: None,
                enabled: true,
                last_run: None,
            })
            .await
            .unwrap();
        assert!(TaskStore::get(&store, task_id).await.is_ok());

        assert_eq!(SessionStore::message_count(&store, "s1").await.unwrap(), 0);
    }
}
