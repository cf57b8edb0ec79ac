//! Construction of a delegated task's synthetic child session id.

use chrono::Utc;
use hybridclaw_core::safe_id;

/// Clip a sanitized parent id to this many characters.
const MAX_SAFE_PARENT_LEN: usize = 48;

/// Build a child session id: `delegate:d<N>:<safeParent>:<ts>:<nonce>`.
#[must_use]
pub fn build(depth: u32, parent_session_id: &str) -> String {
    let mut safe_parent = safe_id(parent_session_id);
    safe_parent.truncate(MAX_SAFE_PARENT_LEN);
    let ts = Utc::now().timestamp_millis();
    let nonce = &uuid::Uuid::new_v4().simple().to_string()[..8];
    format!("delegate:d{depth}:{safe_parent}:{ts}:{nonce}")
}

/// The base tool set granted to any subagent turn, before the conditional
/// `delegate` addition.
pub const BASE_SUBAGENT_TOOLS: &[&str] = &["read", "write", "edit", "glob", "grep", "bash", "web_fetch"];

/// Compute the allowed-tools set for a task dispatched at `depth`: the
/// base subagent set, plus `delegate` when the task could itself delegate
/// without exceeding `max_depth`.
#[must_use]
pub fn allowed_tools(depth: u32, max_depth: u32) -> Vec<String> {
    let mut tools: Vec<String> = BASE_SUBAGENT_TOOLS.iter().map(|s| (*s).to_owned()).collect();
    if depth + 1 < max_depth {
        tools.push("delegate".to_owned());
    }
    tools
}
