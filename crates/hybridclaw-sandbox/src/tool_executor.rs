//! Dependency-inversion seam for tool execution: this crate drives the turn
//! loop and security gate without depending on any concrete tool crate
//! (`read`/`write`/`bash`/... live in the host binary that wires a concrete
//! implementation in). Mirrors `hybridclaw_delegation::AgentDispatcher` and
//! `hybridclaw_compaction::IsolatedTurnRunner`.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::TurnContext;

/// Runs one tool call and returns its result text. Tool-level failures are
/// represented *in* the returned string (e.g. `"Error: file not found"`),
/// not as an `Err` — only a result string ever flows back into history.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `name(args)`. `ctx` carries per-turn mutable state — the
    /// `cron` tool's `add`/`remove` actions append to
    /// `ctx.pending_schedules` rather than touching storage directly.
    async fn execute(&self, ctx: &TurnContext, name: &str, args: Value) -> String;
}
