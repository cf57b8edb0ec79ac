//! Hybridclaw Compaction - best-effort session compaction triggered after
//! each user turn.
//!
//! Below `message_count_threshold` this is a no-op. Otherwise an optional
//! memory-flush turn gets a last look at the messages about to be
//! dropped, a summarization turn merges them with the session's existing
//! summary, and only a non-empty summary is committed: older messages
//! deleted, summary replaced. Every step is best-effort; any failure
//! leaves the session unchanged.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod compaction;
mod error;
mod memory_flush;
mod store;
mod summarize;
mod transcript;
mod turn;
mod types;

pub mod prelude;

pub use compaction::compact_session_if_needed;
pub use error::{CompactionError, CompactionResult};
pub use store::{InMemorySessionStore, SessionStore};
pub use transcript::format_transcript;
pub use turn::{IsolatedTurnRequest, IsolatedTurnRunner};
pub use types::{CompactionOutcome, CompactionThresholds, Message};
