//! Delegation manager error types.

use thiserror::Error;

/// Errors raised normalizing, capping, or executing a delegation plan.
#[derive(Debug, Error)]
pub enum DelegationError {
    /// The plan's task count exceeds the per-plan limit of 6.
    #[error("delegation plan has {count} tasks, exceeding the limit of 6")]
    TooManyTasks {
        /// The offending task count.
        count: usize,
    },

    /// Single mode with no top-level prompt.
    #[error("single-mode delegation requires a prompt")]
    MissingSinglePrompt,

    /// A task in `tasks` or `chain` has no prompt.
    #[error("delegation task at index {index} has no prompt")]
    MissingTaskPrompt {
        /// Index of the offending task.
        index: usize,
    },

    /// Accepting this plan would push the parent depth past `MAX_DEPTH`.
    #[error("delegation depth {depth} exceeds the maximum of {max_depth}")]
    DepthExceeded {
        /// The depth this plan would run at.
        depth: u32,
        /// The configured maximum.
        max_depth: u32,
    },

    /// Accepting this plan's tasks would push the turn's accepted total
    /// past `MAX_PER_TURN`.
    #[error("accepting {requested} tasks would push this turn's total to {total}, exceeding the limit of {max_per_turn}")]
    PerTurnCapExceeded {
        /// Tasks this plan is requesting.
        requested: usize,
        /// Total that would result if accepted.
        total: usize,
        /// The configured per-turn maximum.
        max_per_turn: usize,
    },

    /// The queue is full (the worker rejects new submissions rather than
    /// unbounded buffering).
    #[error("delegation queue is full")]
    QueueFull,

    /// The manager's worker task has shut down.
    #[error("delegation worker is no longer running")]
    WorkerGone,
}

/// Result type for delegation operations.
pub type DelegationResult<T> = Result<T, DelegationError>;
