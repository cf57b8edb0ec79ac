//! [`hybridclaw_compaction::IsolatedTurnRunner`] implementation: runs a
//! memory-flush or summarization turn in the owning session's own agent
//! workspace, since compaction operates on a live session rather than a
//! synthetic child one.

use std::sync::Arc;

use async_trait::async_trait;
use hybridclaw_compaction::{IsolatedTurnRequest, IsolatedTurnRunner};
use hybridclaw_core::HybridclawHome;
use hybridclaw_storage::Store;

use crate::bootstrap::ensure_agent_workspace;
use crate::isolated::{IsolatedRunner, IsolatedTurnSpec};

/// Drives compaction's internal turns through [`IsolatedRunner`], scoped
/// to whichever agent owns the session being compacted.
pub struct GatewayCompactionRunner {
    runner: IsolatedRunner,
    store: Arc<Store>,
    home: HybridclawHome,
}

impl GatewayCompactionRunner {
    /// Build a compaction runner over a shared isolated-turn runner.
    #[must_use]
    pub fn new(runner: IsolatedRunner, store: Arc<Store>, home: HybridclawHome) -> Self {
        Self { runner, store, home }
    }
}

#[async_trait]
impl IsolatedTurnRunner for GatewayCompactionRunner {
    async fn run(&self, request: IsolatedTurnRequest) -> Result<String, String> {
        let session = self
            .store
            .get_session(&request.session_id)
            .await
            .map_err(|e| e.to_string())?;
        let workspace = ensure_agent_workspace(&self.home, &session.bot_id).await.map_err(|e| e.to_string())?;
        let model = session.model.unwrap_or_else(|| "gpt-4o-mini".to_owned());

        let spec = IsolatedTurnSpec {
            session_id: format!("compaction:{}", request.session_id),
            workspace_root: workspace.root().to_path_buf(),
            system_prompt: request.system_prompt,
            user_prompt: request.user_prompt,
            model,
            allowed_tools: request.allowed_tools,
        };

        self.runner.run(spec).await.map(|outcome| outcome.result)
    }
}
