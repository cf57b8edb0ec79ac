//! Wire record and metadata genesis types for the per-session audit log.

use chrono::{DateTime, Utc};
use hybridclaw_core::{RunId, SessionId};
use serde::{Deserialize, Serialize};

/// Protocol version stamped into every session's genesis record.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Current wire record format version.
pub const WIRE_VERSION: u32 = 1;

/// First line of every `wire.jsonl` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataGenesis {
    /// Always `"metadata"`.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Protocol version, currently [`PROTOCOL_VERSION`].
    pub protocol_version: String,
    /// Session this log belongs to.
    pub session_id: SessionId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl MetadataGenesis {
    /// Build a fresh genesis record for `session_id`.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            record_type: "metadata".to_owned(),
            protocol_version: PROTOCOL_VERSION.to_owned(),
            session_id,
            created_at: Utc::now(),
        }
    }
}

/// One hash-chained line of `wire.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    /// Wire format version.
    pub version: u32,
    /// Monotonic, dense sequence number starting at 1.
    pub seq: i64,
    /// When this record was appended.
    pub timestamp: DateTime<Utc>,
    /// Run this event belongs to.
    pub run_id: RunId,
    /// Session this event belongs to.
    pub session_id: SessionId,
    /// Parent run, when this run was spawned by delegation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<RunId>,
    /// The (already redacted) event payload.
    pub event: serde_json::Value,
    /// Hash of the preceding record's canonical form (or the genesis hash for `seq == 1`).
    #[serde(rename = "_prevHash")]
    pub prev_hash: String,
    /// Hash of this record's own canonical form, excluding this field.
    #[serde(rename = "_hash")]
    pub hash: String,
}

/// Outcome of `verify_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// `true` iff every record's `prev_hash` matched its predecessor.
    pub ok: bool,
    /// Number of wire records examined.
    pub checked_records: u64,
    /// Sequence number of the last record examined, or 0 if the log is empty.
    pub last_seq: i64,
    /// Human-readable descriptions of any mismatches found.
    pub errors: Vec<String>,
}

impl VerifyReport {
    /// A clean report for an empty or fully-consistent log.
    #[must_use]
    pub fn ok(checked_records: u64, last_seq: i64) -> Self {
        Self {
            ok: true,
            checked_records,
            last_seq,
            errors: Vec::new(),
        }
    }
}
