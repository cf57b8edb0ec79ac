//! [`hybridclaw_scheduler::TaskRunner`] implementation: every fired task
//! runs as an isolated child session scoped to a dedicated scheduler
//! agent workspace, tool set restricted to `["cron"]`, no prior history.

use async_trait::async_trait;
use hybridclaw_core::HybridclawHome;
use hybridclaw_scheduler::{cron_session_id, SchedulerError, SchedulerResult, Task, TaskRunner};

use crate::bootstrap::ensure_agent_workspace;
use crate::isolated::{IsolatedRunner, IsolatedTurnSpec};
use crate::prompt::isolated_turn_system_prompt;

/// Agent id scheduled tasks run under. Cron tasks have no owning chat
/// session of their own, so they share one dedicated workspace rather
/// than borrowing an arbitrary chat session's.
pub const SCHEDULER_AGENT_ID: &str = "scheduler";

/// Drives scheduler fires through [`IsolatedRunner`].
pub struct GatewayTaskRunner {
    runner: IsolatedRunner,
    home: HybridclawHome,
    model: String,
}

impl GatewayTaskRunner {
    /// Build a task runner over a shared isolated-turn runner.
    #[must_use]
    pub fn new(runner: IsolatedRunner, home: HybridclawHome, model: String) -> Self {
        Self { runner, home, model }
    }
}

#[async_trait]
impl TaskRunner for GatewayTaskRunner {
    async fn run(&self, task: &Task, wrapped_prompt: String) -> SchedulerResult<()> {
        let workspace = ensure_agent_workspace(&self.home, SCHEDULER_AGENT_ID)
            .await
            .map_err(|e| SchedulerError::RunnerFailed { task: task.id, reason: e.to_string() })?;

        let spec = IsolatedTurnSpec {
            session_id: cron_session_id(task.id),
            workspace_root: workspace.root().to_path_buf(),
            system_prompt: isolated_turn_system_prompt("a scheduled task", workspace.root()),
            user_prompt: wrapped_prompt,
            model: self.model.clone(),
            allowed_tools: vec!["cron".to_owned()],
        };

        self.runner
            .run(spec)
            .await
            .map(|_outcome| ())
            .map_err(|reason| SchedulerError::RunnerFailed { task: task.id, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isolated::IsolatedRunner;
    use hybridclaw_core::TaskId;
    use hybridclaw_pool::ContainerPool;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn run_bootstraps_the_shared_scheduler_workspace_then_fails_at_capacity() {
        let home_dir = tempfile::tempdir().unwrap();
        let home = HybridclawHome::from_path(home_dir.path());
        let pool = Arc::new(ContainerPool::new(home.clone(), Duration::from_millis(50)).with_max_concurrent(0));
        let runner = IsolatedRunner::new(pool, home.clone(), "https://api.example/v1".to_owned(), "sk-secret".to_owned(), Duration::from_secs(5));
        let task_runner = GatewayTaskRunner::new(runner, home.clone(), "gpt-4o-mini".to_owned());

        let task = Task { id: TaskId(7), prompt: "check the news".to_owned(), run_at: None, every_ms: Some(60_000), cron_expr: None, enabled: true, last_run: None };

        let result = task_runner.run(&task, "check the news".to_owned()).await;
        assert!(matches!(result, Err(SchedulerError::RunnerFailed { task: TaskId(7), .. })));
        assert!(home.agents_dir().join(hybridclaw_core::safe_id(SCHEDULER_AGENT_ID)).join("MEMORY.md").exists());
    }
}
