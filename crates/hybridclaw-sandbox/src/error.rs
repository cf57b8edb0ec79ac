//! Turn-loop error types.

use thiserror::Error;

/// Errors surfaced by the turn loop itself (as opposed to errors carried as
/// plain strings in a [`crate::types::TurnOutcome::Error`], which represent
/// model/tool failures rather than programming errors).
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The model call exhausted its retry budget.
    #[error("model call failed: {0}")]
    Model(String),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;
