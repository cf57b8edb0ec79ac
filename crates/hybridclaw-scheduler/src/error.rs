//! Scheduler error types.

use hybridclaw_core::TaskId;
use thiserror::Error;

/// Errors raised while managing or ticking the schedule.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A cron expression failed to parse.
    #[error("invalid cron expression {expr:?}: {reason}")]
    InvalidCron {
        /// The rejected expression.
        expr: String,
        /// Parser's reason.
        reason: String,
    },

    /// No task exists with the given id.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// A task definition did not carry exactly one of `run_at`, `every_ms`,
    /// or `cron_expr`.
    #[error("task {0} must specify exactly one of run_at, every_ms, or cron_expr")]
    AmbiguousSchedule(TaskId),

    /// The injected runner callback failed.
    #[error("runner failed for task {task}: {reason}")]
    RunnerFailed {
        /// The task that failed.
        task: TaskId,
        /// The runner's error text.
        reason: String,
    },

    /// The backing [`crate::store::TaskStore`] implementation failed.
    #[error("task store error: {0}")]
    Storage(String),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
