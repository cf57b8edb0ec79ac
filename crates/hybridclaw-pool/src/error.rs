//! Container pool error types.

use thiserror::Error;

/// Errors from acquiring, running a turn against, or tearing down a
/// pooled container.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool is already at its configured concurrency cap and the
    /// requested session has no existing entry to reuse.
    #[error("Too many active containers")]
    TooManyActiveContainers,

    /// Spawning the child process failed.
    #[error("failed to spawn container: {0}")]
    Spawn(#[from] std::io::Error),

    /// A requested extra bind mount fell outside the allow-listed root, or
    /// matched a blocked pattern.
    #[error("bind mount rejected: {0}")]
    BindMountRejected(String),

    /// Sending or receiving over the mailbox failed.
    #[error(transparent)]
    Mailbox(#[from] hybridclaw_mailbox::MailboxError),
}

/// Result type for container pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
