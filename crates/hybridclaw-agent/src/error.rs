//! Top-level error type for the agent binary's turn loop.

use thiserror::Error;

/// Errors fatal to driving the container's turn loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The mailbox failed to deliver or accept a turn.
    #[error(transparent)]
    Mailbox(#[from] hybridclaw_mailbox::MailboxError),

    /// A required environment variable was missing or malformed.
    #[error("missing or invalid environment variable {0}")]
    Env(&'static str),

    /// Logging setup failed.
    #[error(transparent)]
    Telemetry(#[from] hybridclaw_telemetry::TelemetryError),
}

/// Result type for the agent binary.
pub type AgentResult<T> = Result<T, AgentError>;
