//! Dependency-inversion seam between this crate and the sandbox turn
//! runner: this crate defines what a dispatched subagent turn needs and
//! returns, the gateway implements it against the real container pool.

use async_trait::async_trait;

/// Everything needed to dispatch one isolated subagent turn.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Synthetic child session id (`delegate:d<N>:...`).
    pub session_id: String,
    /// The task's prompt, delivered as the sole user message.
    pub prompt: String,
    /// Model to run the turn against.
    pub model: String,
    /// Tool names the turn is restricted to.
    pub allowed_tools: Vec<String>,
}

/// The result of a dispatched subagent turn.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The turn's final result text.
    pub result: String,
    /// Tool names invoked during the turn, in call order.
    pub tools_used: Vec<String>,
}

/// Dispatches one isolated subagent turn and awaits its outcome.
///
/// Implemented by the gateway (which owns the container pool and mailbox);
/// injected here as `Arc<dyn AgentDispatcher>` so this crate never depends
/// on the sandbox or pool crates.
#[async_trait]
pub trait AgentDispatcher: Send + Sync {
    /// Run one subagent turn.
    ///
    /// # Errors
    ///
    /// Returns the turn's error text verbatim; the runtime classifies it
    /// via [`crate::TaskOutcomeStatus::classify`] and
    /// `hybridclaw_core::retry::classify_delegation_error`.
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, String>;
}
