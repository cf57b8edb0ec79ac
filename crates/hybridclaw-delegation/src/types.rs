//! Plan shapes: the raw wire form a turn's side effects carry, and the
//! normalized form the runtime actually executes.

use serde::{Deserialize, Serialize};

/// How a plan's tasks are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationMode {
    /// One task.
    Single,
    /// All tasks launched concurrently.
    Parallel,
    /// Tasks executed in order, each seeing the previous task's output.
    Chain,
}

/// One task inside a `tasks` (parallel) or `chain` (sequential) plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDelegationTask {
    /// Short label for the task, used in the completion report.
    #[serde(default)]
    pub label: Option<String>,
    /// The task's prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Model override for this task, falling back to the plan's model.
    #[serde(default)]
    pub model: Option<String>,
}

/// The raw `delegate` side effect as produced by a turn, before
/// normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDelegationPlan {
    /// Explicit mode; inferred from `tasks`/`chain` when absent.
    #[serde(default)]
    pub mode: Option<DelegationMode>,
    /// Label describing the overall plan, used in the completion report.
    #[serde(default)]
    pub label: Option<String>,
    /// Top-level prompt, used directly in single mode.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Model inherited by tasks that don't override it.
    #[serde(default)]
    pub model: Option<String>,
    /// Tasks to run in parallel.
    #[serde(default)]
    pub tasks: Vec<RawDelegationTask>,
    /// Tasks to run in sequence.
    #[serde(default)]
    pub chain: Vec<RawDelegationTask>,
}

/// One task ready to execute: prompt, model, and label fully resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTask {
    /// Label shown in the completion report; defaults to a 1-based index.
    pub label: String,
    /// The task's prompt.
    pub prompt: String,
    /// Model to run this task against.
    pub model: String,
}

/// A plan that has passed normalization and cap checks, ready to submit
/// to the runtime.
#[derive(Debug, Clone)]
pub struct NormalizedPlan {
    /// Execution mode.
    pub mode: DelegationMode,
    /// Overall plan label, used in the completion report header.
    pub label: Option<String>,
    /// Fully resolved tasks, in execution order.
    pub tasks: Vec<ResolvedTask>,
}

/// Classification of how a completed task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcomeStatus {
    /// The task produced a result.
    Completed,
    /// The task failed with a non-timeout error.
    Failed,
    /// The task's error text indicated a timeout.
    Timeout,
}

/// The outcome of one dispatched task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// The task's label.
    pub label: String,
    /// Synthetic child session id the task ran under.
    pub session_id: String,
    /// Model the task ran against.
    pub model: String,
    /// How the task ended.
    pub status: TaskOutcomeStatus,
    /// The result text on success, or the error text on failure.
    pub output: String,
    /// Names of tools the task invoked, in call order.
    pub tools_used: Vec<String>,
    /// Wall-clock duration of the task, including retries.
    pub duration_ms: u64,
    /// Total attempts made, including the first.
    pub attempts: u32,
}

impl TaskOutcomeStatus {
    /// Classify an error message's status per spec §4.7.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if ["timeout", "timed out", "deadline exceeded"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            Self::Timeout
        } else {
            Self::Failed
        }
    }
}
