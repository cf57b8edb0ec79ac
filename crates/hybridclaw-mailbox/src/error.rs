//! Mailbox error types.

use thiserror::Error;

/// Errors that can occur while exchanging turn requests/responses over the mailbox.
#[derive(Debug, Error)]
pub enum MailboxError {
    /// An I/O error occurred reading, writing, or unlinking a mailbox file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A mailbox file's contents failed to parse as JSON.
    #[error("failed to parse {file}: {source}")]
    Parse {
        /// Which file failed to parse (`input.json` or `output.json`).
        file: &'static str,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// `output.json` exceeded the configured size cap.
    #[error("reply exceeded {limit} bytes ({actual} bytes)")]
    ReplyTooLarge {
        /// Configured maximum in bytes.
        limit: u64,
        /// Actual file size observed.
        actual: u64,
    },

    /// The poll loop exceeded its idle timeout waiting for a reply.
    #[error("timed out after {0:?} waiting for a reply")]
    Timeout(std::time::Duration),
}

/// Result type for mailbox operations.
pub type MailboxResult<T> = Result<T, MailboxError>;
