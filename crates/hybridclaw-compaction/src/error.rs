//! Compaction error types.
//!
//! Compaction is best-effort end to end: every failure returned here is
//! caught by the orchestrator, logged, and leaves the session unchanged
//! rather than aborting the caller's turn.

use thiserror::Error;

/// Errors surfaced by a [`crate::store::SessionStore`] implementation.
#[derive(Debug, Error)]
pub enum CompactionError {
    /// Reading session state failed.
    #[error("failed to read session state: {0}")]
    Read(String),
    /// Committing the compacted summary failed.
    #[error("failed to commit compaction: {0}")]
    Commit(String),
    /// The isolated turn used for memory flush or summarization failed.
    #[error("isolated turn failed: {0}")]
    TurnFailed(String),
}

/// Result type for compaction store operations.
pub type CompactionResult<T> = Result<T, CompactionError>;
