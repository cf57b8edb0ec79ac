//! Shared error types for Hybridclaw core operations.

use thiserror::Error;

/// Errors that can occur in the core orchestration path.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A tool call was rejected by the security hook gate.
    #[error("blocked by security hook: {reason}")]
    HookBlocked {
        /// Reason the hook gave for blocking the call.
        reason: String,
    },

    /// A tool result matched the fatal filesystem error class (EROFS/EPERM/EACCES).
    #[error("fatal filesystem error: {0}")]
    FatalFilesystem(String),

    /// A resolved path escaped its workspace root.
    #[error("path outside workspace: {path}")]
    PathOutsideWorkspace {
        /// The path that was outside the workspace.
        path: String,
    },

    /// Generic configuration problem (missing bot, missing API key, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_blocked_message() {
        let err = CoreError::HookBlocked {
            reason: "dangerous pattern".to_string(),
        };
        assert_eq!(err.to_string(), "blocked by security hook: dangerous pattern");
    }
}
