//! Hybridclaw Audit - append-only, hash-chained per-session event logging.
//!
//! This crate provides:
//! - A per-session `wire.jsonl` append-only log with a metadata genesis record
//! - SHA-256 hash chaining over a hand-rolled canonical JSON form
//! - Automatic secret redaction before hashing
//! - Chain verification by replay
//!
//! # Security model
//!
//! Every wire record embeds the hash of its predecessor's canonical form.
//! Tampering with any historical record, or reordering records, breaks the
//! chain and is detected by [`AuditLog::verify_session`].
//!
//! # Example
//!
//! ```rust,no_run
//! # use hybridclaw_audit::{FileAuditLog, AuditLog};
//! # use hybridclaw_core::{HybridclawHome, RunId, SessionId};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let home = HybridclawHome::from_path("/tmp/hybridclaw-example");
//! let log = FileAuditLog::new(home);
//!
//! let session_id = SessionId::from("session-1");
//! let run_id = RunId::from("run-1");
//!
//! log.append_event(&session_id, &run_id, None, serde_json::json!({"type": "session.start"})).await?;
//!
//! let report = log.verify_session(&session_id).await?;
//! assert!(report.ok);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod canonical;
mod entry;
mod error;
mod redact;
mod storage;

pub use canonical::canonicalize;
pub use entry::{MetadataGenesis, VerifyReport, WireRecord, PROTOCOL_VERSION, WIRE_VERSION};
pub use error::{AuditError, AuditResult};
pub use redact::redact_value;
pub use storage::{AuditLog, FileAuditLog};
