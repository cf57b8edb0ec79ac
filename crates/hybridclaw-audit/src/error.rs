//! Audit-related error types.

use thiserror::Error;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to read or write the on-disk wire log.
    #[error("audit storage error: {0}")]
    Storage(String),

    /// Failed to serialize or deserialize a wire record.
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No session log exists at the expected path.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session ID that was not found.
        session_id: String,
    },

    /// An I/O error occurred while appending or reading the log file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
