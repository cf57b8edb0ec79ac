//! Row shapes returned by [`crate::store::Store`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session id.
    pub id: String,
    /// Guild the session belongs to, if the adapter is guild-scoped.
    pub guild_id: Option<String>,
    /// Channel the session is bound to.
    pub channel_id: String,
    /// Normalized bot/agent id.
    pub bot_id: String,
    /// Chosen model id, once one has been selected.
    pub model: Option<String>,
    /// Whether retrieval-augmented generation is enabled for this session.
    pub enable_rag: bool,
    /// Total messages ever inserted for this session.
    pub message_count: i64,
    /// Compressed prior context, once compaction has run at least once.
    pub session_summary: Option<String>,
    /// When `session_summary` was last replaced.
    pub summary_updated_at: Option<DateTime<Utc>>,
    /// Number of times compaction has committed for this session.
    pub compaction_count: i64,
    /// When the pre-compaction memory flush turn last ran.
    pub memory_flush_at: Option<DateTime<Utc>>,
    /// When the session was first created.
    pub created_at: DateTime<Utc>,
    /// When the session last received a turn.
    pub last_active: DateTime<Utc>,
}

/// A new session to insert, before any turn has run.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Session id.
    pub id: String,
    /// Guild the session belongs to, if the adapter is guild-scoped.
    pub guild_id: Option<String>,
    /// Channel the session is bound to.
    pub channel_id: String,
    /// Normalized bot/agent id.
    pub bot_id: String,
}

/// One stored conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Monotonic row id.
    pub id: i64,
    /// Owning session.
    pub session_id: String,
    /// User id the message is attributed to (the bot's own id for assistant
    /// turns, the adapter's synthetic id for tool results).
    pub user_id: String,
    /// Display name, when the adapter provides one.
    pub username: Option<String>,
    /// `user`, `assistant`, `system`, or `tool`.
    pub role: String,
    /// Message text.
    pub content: String,
    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}

/// A message to insert; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Owning session.
    pub session_id: String,
    /// User id the message is attributed to.
    pub user_id: String,
    /// Display name, when the adapter provides one.
    pub username: Option<String>,
    /// `user`, `assistant`, `system`, or `tool`.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// A row of the database's structured-audit search index. This mirrors the
/// fields of a C1 wire record for `searchStructuredAudit`; the hash-chained
/// `wire.jsonl` files remain the source of truth, this table exists only so
/// the gateway can search across sessions without replaying every file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredAuditRow {
    /// Owning session.
    pub session_id: String,
    /// Dense per-session sequence number.
    pub seq: i64,
    /// The event's type tag.
    pub event_type: String,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Run this event belongs to.
    pub run_id: String,
    /// Parent run, when this run was spawned by delegation.
    pub parent_run_id: Option<String>,
    /// The (already redacted) event payload.
    pub payload: Value,
    /// Hash of the preceding record's canonical form.
    pub wire_prev_hash: String,
    /// Hash of this record's own canonical form.
    pub wire_hash: String,
}

/// One tool-call approval outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalAuditEntry {
    /// Owning session.
    pub session_id: String,
    /// The tool call this approval covers.
    pub tool_call_id: String,
    /// The action that was approved or denied.
    pub action: String,
    /// Whether the action was approved.
    pub approved: bool,
    /// Who or what approved it.
    pub approved_by: String,
    /// `policy`, `interactive`, or `cli`.
    pub method: String,
    /// The policy name, when `method == "policy"`.
    pub policy_name: Option<String>,
    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,
}
