//! Turn request/response payloads exchanged over the mailbox.

use hybridclaw_core::{Role, SessionId};
use serde::{Deserialize, Serialize};

/// A single chat message as carried in a [`TurnRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Message author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// A sanitized view of a scheduled task, included so the container can
/// surface upcoming fires without querying the database store directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedTask {
    /// Task id.
    pub id: i64,
    /// Prompt to run when the task fires.
    pub prompt: String,
    /// Cron expression, if recurring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_expr: Option<String>,
    /// One-shot fire time, if a one-shot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_at: Option<String>,
    /// Fixed interval in milliseconds, if recurring at a fixed cadence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every_ms: Option<i64>,
    /// Whether the task is currently enabled.
    pub enabled: bool,
}

/// Everything needed to drive one turn inside the container, delivered via
/// the mailbox (or, for the first turn, over the container's stdin line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Session this turn belongs to.
    pub session_id: SessionId,
    /// Message history plus the new user message, oldest first.
    pub messages: Vec<WireMessage>,
    /// Bot persona id selected for this session.
    pub bot_id: String,
    /// Whether retrieval-augmented generation is enabled for this turn.
    pub enable_rag: bool,
    /// Model provider base URL.
    pub base_url: String,
    /// Model name to request completions from.
    pub model: String,
    /// API key for the model provider. Present only on the first,
    /// stdin-delivered request; blanked on all subsequent `input.json`
    /// deliveries.
    #[serde(default)]
    pub api_key: String,
    /// Front-end channel id this turn originated from.
    pub channel_id: String,
    /// Sanitized scheduled tasks visible to the container.
    #[serde(default)]
    pub scheduled_tasks: Vec<SanitizedTask>,
    /// Restrict tool use to this explicit allow-list, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
}

/// Outcome status of a turn, as reported by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    /// The turn completed and produced a result.
    Success,
    /// The turn failed.
    Error,
}

/// Record of one tool invocation during the turn, for audit and UI display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecution {
    /// Tool name.
    pub tool: String,
    /// Arguments passed to the tool, as submitted by the model.
    pub arguments: serde_json::Value,
    /// Result returned to the model (or the block/error reason).
    pub result: String,
    /// Whether the security hook blocked this call.
    pub blocked: bool,
}

/// Non-message effects of a turn that the gateway must apply after
/// persisting the turn's messages: new delegation tasks, schedule
/// mutations, etc.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffects {
    /// Delegation plans requested during the turn, to be queued by C8.
    #[serde(default)]
    pub delegations: Vec<serde_json::Value>,
    /// Schedule mutations requested during the turn, to be applied by C7.
    #[serde(default)]
    pub schedule_mutations: Vec<serde_json::Value>,
}

/// The container's reply to a [`TurnRequest`], written to `output.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    /// Whether the turn succeeded.
    pub status: TurnStatus,
    /// The model's final reply text, when `status == Success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// The error message, when `status == Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Names of tools invoked during the turn, in call order.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Detailed per-call tool execution records.
    #[serde(default)]
    pub tool_executions: Vec<ToolExecution>,
    /// Side effects to apply after the turn's messages are persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<SideEffects>,
}

impl TurnResponse {
    /// Build a successful response with no tool calls.
    #[must_use]
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            status: TurnStatus::Success,
            result: Some(result.into()),
            error: None,
            tools_used: Vec::new(),
            tool_executions: Vec::new(),
            side_effects: None,
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: TurnStatus::Error,
            result: None,
            error: Some(message.into()),
            tools_used: Vec::new(),
            tool_executions: Vec::new(),
            side_effects: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_request_round_trips_through_json() {
        let req = TurnRequest {
            session_id: SessionId::from("s1"),
            messages: vec![WireMessage {
                role: Role::User,
                content: "hi".to_owned(),
            }],
            bot_id: "default".to_owned(),
            enable_rag: false,
            base_url: "https://api.example/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key: String::new(),
            channel_id: "chan-1".to_owned(),
            scheduled_tasks: Vec::new(),
            allowed_tools: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: TurnRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, req.session_id);
        assert_eq!(parsed.messages.len(), 1);
    }

    #[test]
    fn success_and_error_constructors() {
        let ok = TurnResponse::success("done");
        assert_eq!(ok.status, TurnStatus::Success);
        assert_eq!(ok.result.as_deref(), Some("done"));

        let err = TurnResponse::error("boom");
        assert_eq!(err.status, TurnStatus::Error);
        assert_eq!(err.error.as_deref(), Some("boom"));
    }

    #[test]
    fn response_omits_absent_optionals_in_json() {
        let ok = TurnResponse::success("done");
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("sideEffects").is_none());
    }
}
