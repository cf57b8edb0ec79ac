//! Structured audit event payloads, named per the turn lifecycle points
//! spec's gateway orchestration names. Each is a plain `Value`; the audit
//! chain (`hybridclaw_audit::FileAuditLog`) owns hashing, redaction, and
//! sequencing.

use serde_json::{json, Value};

/// `session.start`.
#[must_use]
pub fn session_start(session_id: &str, bot_id: &str) -> Value {
    json!({"type": "session.start", "sessionId": session_id, "botId": bot_id})
}

/// `turn.start`.
#[must_use]
pub fn turn_start(channel_id: &str, model: &str) -> Value {
    json!({"type": "turn.start", "channelId": channel_id, "model": model})
}

/// `tool.call`.
#[must_use]
pub fn tool_call(name: &str, arguments: &Value) -> Value {
    json!({"type": "tool.call", "name": name, "arguments": arguments})
}

/// `authorization.check`.
#[must_use]
pub fn authorization_check(name: &str, approved: bool, reason: Option<&str>) -> Value {
    json!({"type": "authorization.check", "name": name, "approved": approved, "reason": reason})
}

/// `approval.request`, emitted only when the security hook blocked a call.
#[must_use]
pub fn approval_request(tool_call_id: &str, action: &str) -> Value {
    json!({"type": "approval.request", "toolCallId": tool_call_id, "action": action})
}

/// `approval.response`, paired with `approval.request`.
#[must_use]
pub fn approval_response(tool_call_id: &str, approved: bool, policy_name: &str) -> Value {
    json!({
        "type": "approval.response",
        "toolCallId": tool_call_id,
        "approved": approved,
        "method": "policy",
        "policyName": policy_name,
    })
}

/// `tool.result`.
#[must_use]
pub fn tool_result(name: &str, blocked: bool) -> Value {
    json!({"type": "tool.result", "name": name, "blocked": blocked})
}

/// `model.usage`.
#[must_use]
pub fn model_usage(duration_ms: u128, tool_call_count: usize) -> Value {
    json!({"type": "model.usage", "durationMs": duration_ms, "toolCallCount": tool_call_count})
}

/// `turn.end`.
#[must_use]
pub fn turn_end(status: &str) -> Value {
    json!({"type": "turn.end", "status": status})
}

/// `error`.
#[must_use]
pub fn error_event(message: &str) -> Value {
    json!({"type": "error", "message": message})
}

/// `session.end`.
#[must_use]
pub fn session_end(status: &str) -> Value {
    json!({"type": "session.end", "status": status})
}
