//! Dependency-inversion seam for the isolated turns compaction runs:
//! memory flush and summarization. Implemented by the gateway against the
//! real container pool, the same way `hybridclaw_delegation::AgentDispatcher`
//! decouples the delegation manager from the sandbox.

use async_trait::async_trait;

/// Everything needed to run one isolated, tool-restricted turn.
#[derive(Debug, Clone)]
pub struct IsolatedTurnRequest {
    /// Parent session this turn compacts on behalf of.
    pub session_id: String,
    /// System prompt for the isolated turn.
    pub system_prompt: String,
    /// The sole user message.
    pub user_prompt: String,
    /// Tool names the turn is restricted to; empty for no tools.
    pub allowed_tools: Vec<String>,
}

/// Runs one isolated turn and returns its final text.
#[async_trait]
pub trait IsolatedTurnRunner: Send + Sync {
    /// Run the turn described by `request`.
    ///
    /// # Errors
    ///
    /// Returns the turn's error text verbatim; compaction treats any
    /// error as non-fatal and leaves the session unchanged for that step.
    async fn run(&self, request: IsolatedTurnRequest) -> Result<String, String>;
}
