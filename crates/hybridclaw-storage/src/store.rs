//! [`Store`]: the single SQLite-backed connection every entity in §3 reads
//! and writes through, wrapped in `spawn_blocking` so callers stay async.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use crate::error::{StorageError, StorageResult};
use crate::schema;
use crate::types::{
    ApprovalAuditEntry, NewMessage, NewSession, Session, StoredMessage, StructuredAuditRow,
};

/// The embedded relational store backing sessions, messages, tasks,
/// structured audit, and approvals. WAL journaling lets readers proceed
/// while a write is in flight; the single connection is still serialized
/// behind a `Mutex` since `rusqlite::Connection` is `Send` but not `Sync`.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database file at `path` and bring its schema
    /// up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot
    /// be created or migrated.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Open an in-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run `f` against the connection on a blocking thread.
    pub(crate) async fn with_conn<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("store connection mutex poisoned");
            f(&conn)
        })
        .await?;
        Ok(result?)
    }

    // ---- sessions ----------------------------------------------------

    /// Create a new session row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_session(&self, new: NewSession) -> StorageResult<Session> {
        let id = new.id.clone();
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO sessions (id, guild_id, channel_id, bot_id, created_at, last_active) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![new.id, new.guild_id, new.channel_id, new.bot_id, now],
            )?;
            get_session_row(conn, &new.id)
        })
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("session {id}")))
    }

    /// Fetch a session by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no such session exists.
    pub async fn get_session(&self, id: &str) -> StorageResult<Session> {
        let id = id.to_owned();
        let found = id.clone();
        self.with_conn(move |conn| get_session_row(conn, &id))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("session {found}")))
    }

    /// Set the session's chosen model.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_session_model(&self, id: &str, model: &str) -> StorageResult<()> {
        let (id, model) = (id.to_owned(), model.to_owned());
        self.with_conn(move |conn| {
            conn.execute("UPDATE sessions SET model = ?1 WHERE id = ?2", params![model, id])?;
            Ok(())
        })
        .await
    }

    /// Flip the session's retrieval-augmented-generation flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_session_rag(&self, id: &str, enable_rag: bool) -> StorageResult<()> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE sessions SET enable_rag = ?1 WHERE id = ?2",
                params![enable_rag, id],
            )?;
            Ok(())
        })
        .await
    }

    /// Stamp the time the memory-flush turn last ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn touch_memory_flush(&self, id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE sessions SET memory_flush_at = ?1 WHERE id = ?2",
                params![at.to_rfc3339(), id],
            )?;
            Ok(())
        })
        .await
    }

    /// Delete a session and everything that belongs to it. The only path by
    /// which a session is destroyed; nothing else does this implicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletes fail.
    pub async fn delete_session(&self, id: &str) -> StorageResult<()> {
        let id = id.to_owned();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM messages WHERE session_id = ?1", params![id])?;
            conn.execute("DELETE FROM tasks WHERE session_id = ?1", params![id])?;
            conn.execute("DELETE FROM structured_audit WHERE session_id = ?1", params![id])?;
            conn.execute("DELETE FROM approvals WHERE session_id = ?1", params![id])?;
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    // ---- messages -----------------------------------------------------

    /// Insert a message and, in the same statement group, bump the
    /// session's `message_count` and `last_active`.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub async fn insert_message(&self, msg: NewMessage) -> StorageResult<StoredMessage> {
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO messages (session_id, user_id, username, role, content, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![msg.session_id, msg.user_id, msg.username, msg.role, msg.content, now],
            )?;
            let id = conn.last_insert_rowid();
            conn.execute(
                "UPDATE sessions SET message_count = message_count + 1, last_active = ?1 WHERE id = ?2",
                params![now, msg.session_id],
            )?;
            conn.query_row(
                "SELECT id, session_id, user_id, username, role, content, created_at \
                 FROM messages WHERE id = ?1",
                params![id],
                row_to_message,
            )
        })
        .await
    }

    /// List messages for a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_messages(&self, session_id: &str) -> StorageResult<Vec<StoredMessage>> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, user_id, username, role, content, created_at \
                 FROM messages WHERE session_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![session_id], row_to_message)?;
            rows.collect()
        })
        .await
    }

    /// Delete every message for a session and reset its `message_count` to
    /// zero, for an explicit session clear.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub async fn clear_messages(&self, session_id: &str) -> StorageResult<()> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM messages WHERE session_id = ?1", params![session_id])?;
            conn.execute(
                "UPDATE sessions SET message_count = 0 WHERE id = ?1",
                params![session_id],
            )?;
            Ok(())
        })
        .await
    }

    /// Delete messages with id `<= cutoff_id` for a session. Named query
    /// `deleteMessagesBeforeId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_messages_before_id(&self, session_id: &str, cutoff_id: i64) -> StorageResult<()> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM messages WHERE session_id = ?1 AND id <= ?2",
                params![session_id, cutoff_id],
            )?;
            Ok(())
        })
        .await
    }

    /// Older-than-`keep_recent` messages plus the id compaction would cut
    /// off at. Named query `getCompactionCandidateMessages`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn compaction_candidate_messages(
        &self,
        session_id: &str,
        keep_recent: usize,
    ) -> StorageResult<(i64, Vec<StoredMessage>)> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            let older_count = total.saturating_sub(keep_recent as i64).max(0);
            if older_count == 0 {
                return Ok((0, Vec::new()));
            }

            let mut stmt = conn.prepare(
                "SELECT id, session_id, user_id, username, role, content, created_at \
                 FROM messages WHERE session_id = ?1 ORDER BY id ASC LIMIT ?2",
            )?;
            let older: Vec<StoredMessage> =
                stmt.query_map(params![session_id, older_count], row_to_message)?.collect::<rusqlite::Result<_>>()?;
            let cutoff_id = older.last().map_or(0, |m| m.id);
            Ok((cutoff_id, older))
        })
        .await
    }

    /// Replace the session's stored summary and bump `compaction_count`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn commit_session_summary(&self, session_id: &str, summary: &str) -> StorageResult<()> {
        let (session_id, summary) = (session_id.to_owned(), summary.to_owned());
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "UPDATE sessions SET session_summary = ?1, summary_updated_at = ?2, \
                 compaction_count = compaction_count + 1 WHERE id = ?3",
                params![summary, now, session_id],
            )?;
            Ok(())
        })
        .await
    }

    // ---- structured audit ---------------------------------------------

    /// Append a row to the structured-audit search index.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_structured_audit(&self, row: StructuredAuditRow) -> StorageResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO structured_audit \
                 (session_id, seq, event_type, timestamp, run_id, parent_run_id, payload, \
                  wire_prev_hash, wire_hash) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.session_id,
                    row.seq,
                    row.event_type,
                    row.timestamp.to_rfc3339(),
                    row.run_id,
                    row.parent_run_id,
                    row.payload.to_string(),
                    row.wire_prev_hash,
                    row.wire_hash,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Search structured audit rows by a substring match against event type
    /// or payload, most recent first. Named query `searchStructuredAudit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn search_structured_audit(&self, query: &str, limit: i64) -> StorageResult<Vec<StructuredAuditRow>> {
        let pattern = format!("%{query}%");
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, seq, event_type, timestamp, run_id, parent_run_id, payload, \
                        wire_prev_hash, wire_hash \
                 FROM structured_audit \
                 WHERE event_type LIKE ?1 OR payload LIKE ?1 \
                 ORDER BY timestamp DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![pattern, limit], row_to_audit_row)?;
            rows.collect()
        })
        .await
    }

    /// Most recent structured audit rows across every session, newest
    /// first. Named query `getRecentAudit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_audit(&self, limit: i64) -> StorageResult<Vec<StructuredAuditRow>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, seq, event_type, timestamp, run_id, parent_run_id, payload, \
                        wire_prev_hash, wire_hash \
                 FROM structured_audit ORDER BY timestamp DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_audit_row)?;
            rows.collect()
        })
        .await
    }

    /// Most recent structured audit rows for one session, newest first.
    /// Named query `getRecentAuditForSession`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_audit_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> StorageResult<Vec<StructuredAuditRow>> {
        let session_id = session_id.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, seq, event_type, timestamp, run_id, parent_run_id, payload, \
                        wire_prev_hash, wire_hash \
                 FROM structured_audit WHERE session_id = ?1 ORDER BY seq DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![session_id, limit], row_to_audit_row)?;
            rows.collect()
        })
        .await
    }

    // ---- approvals ------------------------------------------------------

    /// Record a tool-call approval outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_approval(&self, entry: ApprovalAuditEntry) -> StorageResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO approvals \
                 (session_id, tool_call_id, action, approved, approved_by, method, \
                  policy_name, timestamp) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.session_id,
                    entry.tool_call_id,
                    entry.action,
                    entry.approved,
                    entry.approved_by,
                    entry.method,
                    entry.policy_name,
                    entry.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// The most recent approval outcomes, optionally filtered to denials
    /// only. Named query `getRecentApprovals`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_approvals(&self, limit: i64, denied_only: bool) -> StorageResult<Vec<ApprovalAuditEntry>> {
        self.with_conn(move |conn| {
            let sql = if denied_only {
                "SELECT session_id, tool_call_id, action, approved, approved_by, method, \
                 policy_name, timestamp FROM approvals WHERE approved = 0 \
                 ORDER BY timestamp DESC LIMIT ?1"
            } else {
                "SELECT session_id, tool_call_id, action, approved, approved_by, method, \
                 policy_name, timestamp FROM approvals ORDER BY timestamp DESC LIMIT ?1"
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![limit], row_to_approval)?;
            rows.collect()
        })
        .await
    }
}

fn get_session_row(conn: &Connection, id: &str) -> rusqlite::Result<Option<Session>> {
    conn.query_row(
        "SELECT id, guild_id, channel_id, bot_id, model, enable_rag, message_count, \
                session_summary, summary_updated_at, compaction_count, memory_flush_at, \
                created_at, last_active \
         FROM sessions WHERE id = ?1",
        params![id],
        row_to_session,
    )
    .optional()
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        channel_id: row.get(2)?,
        bot_id: row.get(3)?,
        model: row.get(4)?,
        enable_rag: row.get(5)?,
        message_count: row.get(6)?,
        session_summary: row.get(7)?,
        summary_updated_at: parse_opt_dt(row.get::<_, Option<String>>(8)?),
        compaction_count: row.get(9)?,
        memory_flush_at: parse_opt_dt(row.get::<_, Option<String>>(10)?),
        created_at: parse_dt(&row.get::<_, String>(11)?),
        last_active: parse_dt(&row.get::<_, String>(12)?),
    })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        role: row.get(4)?,
        content: row.get(5)?,
        created_at: parse_dt(&row.get::<_, String>(6)?),
    })
}

fn row_to_audit_row(row: &Row<'_>) -> rusqlite::Result<StructuredAuditRow> {
    let payload_raw: String = row.get(6)?;
    let payload: Value = serde_json::from_str(&payload_raw).unwrap_or(Value::Null);
    Ok(StructuredAuditRow {
        session_id: row.get(0)?,
        seq: row.get(1)?,
        event_type: row.get(2)?,
        timestamp: parse_dt(&row.get::<_, String>(3)?),
        run_id: row.get(4)?,
        parent_run_id: row.get(5)?,
        payload,
        wire_prev_hash: row.get(7)?,
        wire_hash: row.get(8)?,
    })
}

fn row_to_approval(row: &Row<'_>) -> rusqlite::Result<ApprovalAuditEntry> {
    Ok(ApprovalAuditEntry {
        session_id: row.get(0)?,
        tool_call_id: row.get(1)?,
        action: row.get(2)?,
        approved: row.get(3)?,
        approved_by: row.get(4)?,
        method: row.get(5)?,
        policy_name: row.get(6)?,
        timestamp: parse_dt(&row.get::<_, String>(7)?),
    })
}

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .expect("timestamps stored by this crate are always valid rfc3339")
}

fn parse_opt_dt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|s| parse_dt(&s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> NewSession {
        NewSession {
            id: "s1".to_owned(),
            guild_id: None,
            channel_id: "c1".to_owned(),
            bot_id: "bot".to_owned(),
        }
    }

    fn sample_message(session_id: &str) -> NewMessage {
        NewMessage {
            session_id: session_id.to_owned(),
            user_id: "u1".to_owned(),
            username: Some("Al".to_owned()),
            role: "user".to_owned(),
            content: "hi".to_owned(),
        }
    }

    #[tokio::test]
    async fn creates_and_fetches_a_session() {
        let store = Store::open_in_memory().unwrap();
        store.create_session(sample_session()).await.unwrap();
        let session = store.get_session("s1").await.unwrap();
        assert_eq!(session.channel_id, "c1");
        assert_eq!(session.message_count, 0);
        assert!(!session.enable_rag);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.get_session("missing").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn inserting_a_message_bumps_session_counters() {
        let store = Store::open_in_memory().unwrap();
        store.create_session(sample_session()).await.unwrap();
        store.insert_message(sample_message("s1")).await.unwrap();
        store.insert_message(sample_message("s1")).await.unwrap();

        let session = store.get_session("s1").await.unwrap();
        assert_eq!(session.message_count, 2);

        let messages = store.list_messages("s1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hi");
    }

    #[tokio::test]
    async fn clear_messages_resets_count() {
        let store = Store::open_in_memory().unwrap();
        store.create_session(sample_session()).await.unwrap();
        store.insert_message(sample_message("s1")).await.unwrap();
        store.clear_messages("s1").await.unwrap();

        assert!(store.list_messages("s1").await.unwrap().is_empty());
        assert_eq!(store.get_session("s1").await.unwrap().message_count, 0);
    }

    #[tokio::test]
    async fn compaction_candidates_exclude_most_recent() {
        let store = Store::open_in_memory().unwrap();
        store.create_session(sample_session()).await.unwrap();
        for _ in 0..10 {
            store.insert_message(sample_message("s1")).await.unwrap();
        }

        let (cutoff, older) = store.compaction_candidate_messages("s1", 4).await.unwrap();
        assert_eq!(older.len(), 6);
        assert_eq!(cutoff, older.last().unwrap().id);
    }

    #[tokio::test]
    async fn commit_summary_bumps_compaction_count() {
        let store = Store::open_in_memory().unwrap();
        store.create_session(sample_session()).await.unwrap();
        store.commit_session_summary("s1", "a summary").await.unwrap();

        let session = store.get_session("s1").await.unwrap();
        assert_eq!(session.session_summary.as_deref(), Some("a summary"));
        assert_eq!(session.compaction_count, 1);
    }

    #[tokio::test]
    async fn searches_structured_audit_by_event_type() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_structured_audit(StructuredAuditRow {
                session_id: "s1".to_owned(),
                seq: 1,
                event_type: "tool.call".to_owned(),
                timestamp: Utc::now(),
                run_id: "r1".to_owned(),
                parent_run_id: None,
                payload: serde_json::json!({"tool": "bash"}),
                wire_prev_hash: "a".to_owned(),
                wire_hash: "b".to_owned(),
            })
            .await
            .unwrap();

        let results = store.search_structured_audit("tool.call", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].run_id, "r1");
    }

    #[tokio::test]
    async fn recent_audit_spans_sessions_newest_first() {
        let store = Store::open_in_memory().unwrap();
        for (session_id, seq) in [("s1", 1), ("s2", 1), ("s1", 2)] {
            store
                .insert_structured_audit(StructuredAuditRow {
                    session_id: session_id.to_owned(),
                    seq,
                    event_type: "turn.start".to_owned(),
                    timestamp: Utc::now(),
                    run_id: "r1".to_owned(),
                    parent_run_id: None,
                    payload: serde_json::json!({}),
                    wire_prev_hash: "a".to_owned(),
                    wire_hash: "b".to_owned(),
                })
                .await
                .unwrap();
        }

        let all = store.recent_audit(10).await.unwrap();
        assert_eq!(all.len(), 3);

        let s1_only = store.recent_audit_for_session("s1", 10).await.unwrap();
        assert_eq!(s1_only.len(), 2);
        assert!(s1_only.iter().all(|row| row.session_id == "s1"));
        assert_eq!(s1_only[0].seq, 2);
    }

    #[tokio::test]
    async fn recent_approvals_filters_denied_only() {
        let store = Store::open_in_memory().unwrap();
        for (tool_call_id, approved) in [("a", true), ("b", false)] {
            store
                .insert_approval(ApprovalAuditEntry {
                    session_id: "s1".to_owned(),
                    tool_call_id: tool_call_id.to_owned(),
                    action: "bash".to_owned(),
                    approved,
                    approved_by: "policy".to_owned(),
                    method: "policy".to_owned(),
                    policy_name: Some("default".to_owned()),
                    timestamp: Utc::now(),
                })
                .await
                .unwrap();
        }

        let denied = store.recent_approvals(10, true).await.unwrap();
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].tool_call_id, "b");

        let all = store.recent_approvals(10, false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn delete_session_removes_its_messages() {
        let store = Store::open_in_memory().unwrap();
        store.create_session(sample_session()).await.unwrap();
        store.insert_message(sample_message("s1")).await.unwrap();
        store.delete_session("s1").await.unwrap();

        assert!(matches!(store.get_session("s1").await, Err(StorageError::NotFound(_))));
    }
}
