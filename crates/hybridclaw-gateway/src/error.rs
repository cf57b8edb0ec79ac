//! Gateway error type, aggregating every subsystem the turn driver touches.

use thiserror::Error;

/// Errors raised resolving a session, bootstrapping a workspace, or
/// driving a turn through the container pool.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The database store failed.
    #[error(transparent)]
    Storage(#[from] hybridclaw_storage::StorageError),

    /// The audit chain failed to append or replay.
    #[error(transparent)]
    Audit(#[from] hybridclaw_audit::AuditError),

    /// The container pool failed to acquire or run a turn.
    #[error(transparent)]
    Pool(#[from] hybridclaw_pool::PoolError),

    /// Normalizing or capping a delegation plan failed.
    #[error(transparent)]
    Delegation(#[from] hybridclaw_delegation::DelegationError),

    /// Scheduler bookkeeping failed.
    #[error(transparent)]
    Scheduler(#[from] hybridclaw_scheduler::SchedulerError),

    /// Workspace bootstrap I/O failed.
    #[error("workspace bootstrap failed: {0}")]
    Workspace(#[from] std::io::Error),

    /// The turn itself failed inside the container (a model error, not a
    /// pool/mailbox failure).
    #[error("turn failed: {0}")]
    TurnFailed(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
