//! Turn-loop types: the bounded-iteration request/response shapes and the
//! per-process state reset at the start of every turn.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hybridclaw_llm::{LlmToolDefinition, Message};

/// Bound on turn-loop iterations before giving up (spec default).
pub const MAX_ITERATIONS: u32 = 20;

/// One incoming turn: the running history plus the tools on offer.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// The session this turn belongs to, used only for log correlation.
    pub session_id: String,
    /// System prompt sent alongside `messages` on every model call.
    pub system_prompt: String,
    /// Conversation history so far, including the new user message.
    pub messages: Vec<Message>,
    /// Tool definitions offered to the model this turn.
    pub tools: Vec<LlmToolDefinition>,
}

/// Record of one tool execution, reported back to the host alongside the
/// turn result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    /// The tool call id this record responds to.
    pub tool_call_id: String,
    /// Tool name invoked.
    pub name: String,
    /// Wall-clock duration of the call (0 when blocked before running).
    pub duration_ms: u64,
    /// Whether the result should be treated as an error.
    pub is_error: bool,
    /// Whether the security hook gate blocked this call.
    pub blocked: bool,
    /// The blocking reason, when `blocked` is true.
    pub blocked_reason: Option<String>,
}

/// Side effects accumulated over a turn and handed back to the host for
/// resolution against durable storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideEffects {
    /// Pending `cron` mutations requested this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<Value>,
}

/// Per-turn mutable state shared with the injected [`crate::tool_executor::ToolExecutor`],
/// reset at the start of every turn.
#[derive(Debug, Default)]
pub struct TurnContext {
    /// Appended to by the `cron` tool; never touched by this crate directly.
    pub pending_schedules: Mutex<Vec<Value>>,
}

impl TurnContext {
    /// A fresh, empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the accumulated schedule mutations, leaving the context empty.
    pub fn take_schedules(&self) -> Vec<Value> {
        std::mem::take(&mut self.pending_schedules.lock().expect("pending_schedules poisoned"))
    }
}

/// Outcome of running one bounded turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The turn produced a final assistant reply.
    Success {
        /// The assistant's final text content.
        content: String,
        /// Every tool call executed this turn, in order.
        tool_executions: Vec<ToolExecutionRecord>,
        /// Accumulated side effects to hand back to the host.
        side_effects: SideEffects,
    },
    /// The turn ended in an unrecoverable error.
    Error {
        /// Human-readable error message.
        message: String,
        /// Tool calls executed before the error, in order.
        tool_executions: Vec<ToolExecutionRecord>,
        /// Accumulated side effects to hand back to the host.
        side_effects: SideEffects,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_schedules_drains_and_resets() {
        let ctx = TurnContext::new();
        ctx.pending_schedules.lock().unwrap().push(serde_json::json!({"id": 1}));
        let drained = ctx.take_schedules();
        assert_eq!(drained.len(), 1);
        assert!(ctx.take_schedules().is_empty());
    }
}
