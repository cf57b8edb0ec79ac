//! Shared dispatch path for every turn that isn't the main per-request
//! chat turn: scheduled-task fires (C7), delegated subagent turns (C8),
//! and compaction's memory-flush/summarization turns (C9). Each is a
//! single request/response turn in a fresh child session with no prior
//! history, run through the same container pool as ordinary turns.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hybridclaw_core::{HybridclawHome, Role, SessionId, safe_id};
use hybridclaw_mailbox::{TurnRequest, TurnStatus, WireMessage};
use hybridclaw_pool::{ContainerPool, SpawnArgs, DEFAULT_IMAGE};

/// Everything needed to run one isolated turn.
#[derive(Debug, Clone)]
pub struct IsolatedTurnSpec {
    /// Synthetic session id (`cron:<id>`, `delegate:d<n>:...`, or a
    /// compaction-internal id).
    pub session_id: String,
    /// Agent workspace root this turn runs against.
    pub workspace_root: PathBuf,
    /// System prompt for the turn.
    pub system_prompt: String,
    /// The turn's sole user message.
    pub user_prompt: String,
    /// Model to run the turn against.
    pub model: String,
    /// Tool names the turn is restricted to; empty means no tools.
    pub allowed_tools: Vec<String>,
}

/// Outcome of one isolated turn.
#[derive(Debug, Clone)]
pub struct IsolatedTurnOutcome {
    /// The turn's final result text.
    pub result: String,
    /// Tool names invoked, in call order.
    pub tools_used: Vec<String>,
}

/// Runs [`IsolatedTurnSpec`]s through the container pool, sharing the
/// model endpoint and API key every other turn in this gateway uses.
pub struct IsolatedRunner {
    pool: Arc<ContainerPool>,
    home: HybridclawHome,
    base_url: String,
    api_key: String,
    idle_timeout: Duration,
}

impl IsolatedRunner {
    /// Build a runner over an already-constructed pool.
    #[must_use]
    pub fn new(pool: Arc<ContainerPool>, home: HybridclawHome, base_url: String, api_key: String, idle_timeout: Duration) -> Self {
        Self { pool, home, base_url, api_key, idle_timeout }
    }

    /// Run one isolated turn to completion.
    ///
    /// # Errors
    ///
    /// Returns the turn's error text verbatim, whether it came from the
    /// pool (spawn/mailbox failure) or from the turn itself.
    pub async fn run(&self, spec: IsolatedTurnSpec) -> Result<IsolatedTurnOutcome, String> {
        let session_id = SessionId::from(spec.session_id);
        let mailbox_dir = self.home.mailboxes_dir().join(safe_id(session_id.as_str()));

        let spawn_args = SpawnArgs {
            image: DEFAULT_IMAGE.to_owned(),
            workspace_dir: spec.workspace_root,
            mailbox_dir,
            extra_mounts: Vec::new(),
            run_as: None,
            base_url: self.base_url.clone(),
            model: spec.model.clone(),
            idle_timeout: self.idle_timeout,
        };

        let request = TurnRequest {
            session_id: session_id.clone(),
            messages: vec![
                WireMessage { role: Role::System, content: spec.system_prompt },
                WireMessage { role: Role::User, content: spec.user_prompt },
            ],
            bot_id: "isolated".to_owned(),
            enable_rag: false,
            base_url: spawn_args.base_url.clone(),
            model: spec.model,
            api_key: self.api_key.clone(),
            channel_id: "isolated".to_owned(),
            scheduled_tasks: Vec::new(),
            allowed_tools: Some(spec.allowed_tools),
        };

        let response = self
            .pool
            .run_turn(&session_id, request, &spawn_args, None)
            .await
            .map_err(|e| e.to_string())?;

        match response.status {
            TurnStatus::Success => Ok(IsolatedTurnOutcome {
                result: response.result.unwrap_or_default(),
                tools_used: response.tools_used,
            }),
            TurnStatus::Error => Err(response.error.unwrap_or_else(|| "isolated turn failed".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_surfaces_the_pool_error_when_at_capacity() {
        let home_dir = tempfile::tempdir().unwrap();
        let home = HybridclawHome::from_path(home_dir.path());
        let pool = Arc::new(ContainerPool::new(home.clone(), Duration::from_millis(50)).with_max_concurrent(0));
        let runner = IsolatedRunner::new(pool, home, "https://api.example/v1".to_owned(), "sk-secret".to_owned(), Duration::from_secs(5));

        let workspace = tempfile::tempdir().unwrap();
        let spec = IsolatedTurnSpec {
            session_id: "cron:1".to_owned(),
            workspace_root: workspace.path().to_path_buf(),
            system_prompt: "you are a cron runner".to_owned(),
            user_prompt: "do the thing".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            allowed_tools: vec!["cron".to_owned()],
        };

        let result = runner.run(spec).await;
        assert!(result.is_err());
    }
}
