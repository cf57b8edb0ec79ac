//! [`hybridclaw_delegation::AgentDispatcher`] implementation: runs a
//! delegated subagent turn through the same container pool as every other
//! turn, in the delegating agent's own workspace.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use hybridclaw_core::{HybridclawHome, safe_id};
use hybridclaw_delegation::{AgentDispatcher, DispatchOutcome, DispatchRequest};

use crate::bootstrap::ensure_agent_workspace;
use crate::isolated::{IsolatedRunner, IsolatedTurnSpec};
use crate::prompt::isolated_turn_system_prompt;

/// Fallback agent id used only if a delegated turn's parent session was
/// never registered (should not happen in normal operation).
const FALLBACK_BOT_ID: &str = "delegate-fallback";

/// Resolves a delegated child session back to the bot id whose workspace
/// it runs in, then drives the turn through [`IsolatedRunner`].
///
/// Child session ids embed a truncated, sanitized copy of their parent
/// session id but not the parent's bot id, so the gateway records the
/// mapping at submission time via [`Self::register_parent`].
pub struct GatewayAgentDispatcher {
    runner: IsolatedRunner,
    home: HybridclawHome,
    parents: Mutex<HashMap<String, String>>,
}

impl GatewayAgentDispatcher {
    /// Build a dispatcher over a shared isolated-turn runner.
    #[must_use]
    pub fn new(runner: IsolatedRunner, home: HybridclawHome) -> Self {
        Self { runner, home, parents: Mutex::new(HashMap::new()) }
    }

    /// Record that `parent_session_id` belongs to `bot_id`, so a child
    /// session id derived from it can later be resolved back to a
    /// workspace. Must be called before submitting a plan whose parent is
    /// `parent_session_id`.
    pub fn register_parent(&self, parent_session_id: &str, bot_id: &str) {
        let mut safe_parent = safe_id(parent_session_id);
        safe_parent.truncate(48);
        self.parents.lock().expect("parents mutex poisoned").insert(safe_parent, bot_id.to_owned());
    }

    fn resolve_bot_id(&self, child_session_id: &str) -> String {
        let safe_parent = child_session_id.split(':').nth(2).unwrap_or_default();
        self.parents
            .lock()
            .expect("parents mutex poisoned")
            .get(safe_parent)
            .cloned()
            .unwrap_or_else(|| FALLBACK_BOT_ID.to_owned())
    }
}

#[async_trait]
impl AgentDispatcher for GatewayAgentDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, String> {
        let bot_id = self.resolve_bot_id(&request.session_id);
        let workspace = ensure_agent_workspace(&self.home, &bot_id).await.map_err(|e| e.to_string())?;

        let spec = IsolatedTurnSpec {
            session_id: request.session_id,
            workspace_root: workspace.root().to_path_buf(),
            system_prompt: isolated_turn_system_prompt("a delegated subagent task", workspace.root()),
            user_prompt: request.prompt,
            model: request.model,
            allowed_tools: request.allowed_tools,
        };

        let outcome = self.runner.run(spec).await?;
        Ok(DispatchOutcome { result: outcome.result, tools_used: outcome.tools_used })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridclaw_pool::ContainerPool;
    use std::time::Duration;

    fn dispatcher(home: &HybridclawHome) -> GatewayAgentDispatcher {
        let pool = Arc::new(ContainerPool::new(home.clone(), Duration::from_millis(50)).with_max_concurrent(0));
        let runner = IsolatedRunner::new(pool, home.clone(), "https://api.example/v1".to_owned(), "sk-secret".to_owned(), Duration::from_secs(5));
        GatewayAgentDispatcher::new(runner, home.clone())
    }

    #[tokio::test]
    async fn dispatch_resolves_the_registered_parent_workspace() {
        let home_dir = tempfile::tempdir().unwrap();
        let home = HybridclawHome::from_path(home_dir.path());
        let dispatcher = dispatcher(&home);
        dispatcher.register_parent("chan:parent-session", "researcher");

        let child_session_id = hybridclaw_delegation::build_child_session_id(1, "chan:parent-session");
        let request = DispatchRequest {
            session_id: child_session_id,
            prompt: "summarize the thread".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            allowed_tools: hybridclaw_delegation::allowed_tools(1, 3),
        };

        let result = dispatcher.dispatch(request).await;
        assert!(result.is_err());
        assert!(home.agents_dir().join(safe_id("researcher")).join("MEMORY.md").exists());
    }

    #[tokio::test]
    async fn dispatch_falls_back_when_parent_was_never_registered() {
        let home_dir = tempfile::tempdir().unwrap();
        let home = HybridclawHome::from_path(home_dir.path());
        let dispatcher = dispatcher(&home);

        let child_session_id = hybridclaw_delegation::build_child_session_id(0, "chan:never-registered");
        let request = DispatchRequest {
            session_id: child_session_id,
            prompt: "do it".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            allowed_tools: vec![],
        };

        let result = dispatcher.dispatch(request).await;
        assert!(result.is_err());
        assert!(home.agents_dir().join(safe_id(FALLBACK_BOT_ID)).join("MEMORY.md").exists());
    }
}
