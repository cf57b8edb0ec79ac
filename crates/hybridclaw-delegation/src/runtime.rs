//! Executes a normalized plan: one task, all tasks concurrently, or tasks
//! in sequence with `{previous}` substitution, each wrapped in the shared
//! retry-with-backoff policy.

use std::time::Instant;

use hybridclaw_core::retry::{
    classify_delegation_error, retry_with_backoff, DelegationErrorClass, RetryConfig, RetryOutcome,
};

use crate::child_session::{allowed_tools, build as build_session_id};
use crate::dispatcher::{AgentDispatcher, DispatchRequest};
use crate::types::{DelegationMode, NormalizedPlan, ResolvedTask, TaskOutcome, TaskOutcomeStatus};

/// Maximum length of the trimmed previous-task output substituted for
/// `{previous}` in a chain.
const MAX_PREVIOUS_SUBSTITUTION_CHARS: usize = 4000;

/// Execute `plan` at `depth` (already capped by the caller), returning one
/// [`TaskOutcome`] per task actually dispatched. A chain stops at the
/// first non-completion, so its result list may be shorter than its task
/// list.
pub async fn execute(
    plan: &NormalizedPlan,
    parent_session_id: &str,
    depth: u32,
    max_depth: u32,
    dispatcher: &dyn AgentDispatcher,
) -> Vec<TaskOutcome> {
    let tools = allowed_tools(depth, max_depth);

    match plan.mode {
        DelegationMode::Single | DelegationMode::Parallel => {
            let futures = plan.tasks.iter().map(|task| {
                dispatch_one(task, task.prompt.clone(), parent_session_id, depth, &tools, dispatcher)
            });
            futures::future::join_all(futures).await
        }
        DelegationMode::Chain => execute_chain(plan, parent_session_id, depth, &tools, dispatcher).await,
    }
}

async fn execute_chain(
    plan: &NormalizedPlan,
    parent_session_id: &str,
    depth: u32,
    tools: &[String],
    dispatcher: &dyn AgentDispatcher,
) -> Vec<TaskOutcome> {
    let mut outcomes = Vec::with_capacity(plan.tasks.len());
    let mut previous_output: Option<String> = None;

    for task in &plan.tasks {
        let prompt = match &previous_output {
            Some(prev) => task.prompt.replace("{previous}", prev),
            None => task.prompt.clone(),
        };

        let outcome = dispatch_one(task, prompt, parent_session_id, depth, tools, dispatcher).await;
        let completed = outcome.status == TaskOutcomeStatus::Completed;
        previous_output = Some(truncate_chars(&outcome.output, MAX_PREVIOUS_SUBSTITUTION_CHARS));
        outcomes.push(outcome);

        if !completed {
            break;
        }
    }

    outcomes
}

async fn dispatch_one(
    task: &ResolvedTask,
    prompt: String,
    parent_session_id: &str,
    depth: u32,
    tools: &[String],
    dispatcher: &dyn AgentDispatcher,
) -> TaskOutcome {
    let session_id = build_session_id(depth, parent_session_id);
    let started = Instant::now();

    let outcome = retry_with_backoff(
        RetryConfig::default(),
        |_attempt| {
            let request = DispatchRequest {
                session_id: session_id.clone(),
                prompt: prompt.clone(),
                model: task.model.clone(),
                allowed_tools: tools.to_vec(),
            };
            dispatcher.dispatch(request)
        },
        |error: &String| !matches!(classify_delegation_error(error), DelegationErrorClass::Permanent),
        |attempt, delay| {
            tracing::debug!(task = %task.label, attempt, ?delay, "retrying delegated task");
        },
    )
    .await;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        RetryOutcome::Succeeded { value, attempt } => TaskOutcome {
            label: task.label.clone(),
            session_id,
            model: task.model.clone(),
            status: TaskOutcomeStatus::Completed,
            output: value.result,
            tools_used: value.tools_used,
            duration_ms,
            attempts: attempt,
        },
        RetryOutcome::Exhausted { last_error, attempts } => TaskOutcome {
            label: task.label.clone(),
            session_id,
            model: task.model.clone(),
            status: TaskOutcomeStatus::classify(&last_error),
            output: last_error,
            tools_used: Vec::new(),
            duration_ms,
            attempts,
        },
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.trim().to_owned()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        truncated.trim().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedDispatcher {
        calls: AtomicUsize,
        prompts_seen: Mutex<Vec<String>>,
        script: Vec<Result<&'static str, &'static str>>,
    }

    #[async_trait]
    impl AgentDispatcher for ScriptedDispatcher {
        async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, String> {
            self.prompts_seen.lock().unwrap().push(request.prompt);
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script[index % self.script.len()] {
                Ok(text) => Ok(DispatchOutcome {
                    result: text.to_owned(),
                    tools_used: vec!["bash".to_owned()],
                }),
                Err(e) => Err(e.to_owned()),
            }
        }
    }

    fn task(label: &str, prompt: &str) -> ResolvedTask {
        ResolvedTask {
            label: label.to_owned(),
            prompt: prompt.to_owned(),
            model: "gpt-4o-mini".to_owned(),
        }
    }

    #[tokio::test]
    async fn single_task_dispatches_once_on_success() {
        let dispatcher = ScriptedDispatcher {
            calls: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
            script: vec![Ok("done")],
        };
        let plan = NormalizedPlan {
            mode: DelegationMode::Single,
            label: None,
            tasks: vec![task("task 1", "go")],
        };

        let outcomes = execute(&plan, "chan-1", 1, 3, &dispatcher).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, TaskOutcomeStatus::Completed);
        assert_eq!(outcomes[0].output, "done");
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let dispatcher = ScriptedDispatcher {
            calls: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
            script: vec![Err("forbidden by policy")],
        };
        let plan = NormalizedPlan {
            mode: DelegationMode::Single,
            label: None,
            tasks: vec![task("task 1", "go")],
        };

        let outcomes = execute(&plan, "chan-1", 1, 3, &dispatcher).await;
        assert_eq!(outcomes[0].attempts, 1);
        assert_eq!(outcomes[0].status, TaskOutcomeStatus::Failed);
    }

    #[tokio::test]
    async fn chain_substitutes_previous_output_and_stops_on_failure() {
        let dispatcher = ScriptedDispatcher {
            calls: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
            script: vec![Ok("first result"), Err("forbidden")],
        };
        let plan = NormalizedPlan {
            mode: DelegationMode::Chain,
            label: None,
            tasks: vec![task("step 1", "start"), task("step 2", "use: {previous}"), task("step 3", "never runs")],
        };

        let outcomes = execute(&plan, "chan-1", 1, 3, &dispatcher).await;
        assert_eq!(outcomes.len(), 2, "chain must stop after the second task fails");
        assert_eq!(outcomes[0].status, TaskOutcomeStatus::Completed);
        assert_eq!(outcomes[1].status, TaskOutcomeStatus::Failed);

        let prompts = dispatcher.prompts_seen.lock().unwrap();
        assert_eq!(prompts[1], "use: first result");
    }

    #[tokio::test]
    async fn parallel_tasks_all_dispatch() {
        let dispatcher = ScriptedDispatcher {
            calls: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
            script: vec![Ok("a"), Ok("b")],
        };
        let plan = NormalizedPlan {
            mode: DelegationMode::Parallel,
            label: None,
            tasks: vec![task("t1", "a"), task("t2", "b")],
        };

        let outcomes = execute(&plan, "chan-1", 1, 3, &dispatcher).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.status == TaskOutcomeStatus::Completed));
    }
}
