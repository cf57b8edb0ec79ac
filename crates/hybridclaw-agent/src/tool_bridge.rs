//! Adapts `hybridclaw_tools::ToolRegistry` to the
//! [`hybridclaw_sandbox::ToolExecutor`] seam, and prints the stderr
//! progress lines `hybridclaw_pool` parses (spec §4.5).

use std::time::Instant;

use async_trait::async_trait;
use hybridclaw_sandbox::TurnContext;
use hybridclaw_tools::{ToolContext, ToolRegistry};
use serde_json::Value;

/// Collapse a value (or tool result text) to a single stderr line, so the
/// pool's line-by-line reader sees one `[tool] ...` record per call instead
/// of the preview's content splitting across several lines.
fn single_line_preview(raw: &str) -> String {
    let collapsed = raw.replace('\n', " ");
    hybridclaw_tools::truncate_at_char_boundary(&collapsed, 200)
}

/// Bridges the turn loop's [`ToolExecutor`] seam to the in-process tool
/// registry, syncing `cron` mutations back into the sandbox's
/// [`TurnContext`] after every call.
pub struct BuiltinToolExecutor {
    registry: ToolRegistry,
    tool_ctx: ToolContext,
}

impl BuiltinToolExecutor {
    /// Wrap an already-built registry and context.
    #[must_use]
    pub fn new(registry: ToolRegistry, tool_ctx: ToolContext) -> Self {
        Self { registry, tool_ctx }
    }

    /// Borrow the underlying tool context (e.g. to set the current session
    /// id or injected tasks before a turn).
    #[must_use]
    pub fn tool_ctx(&self) -> &ToolContext {
        &self.tool_ctx
    }

    /// Tool definitions for every registered tool, to offer to the model.
    #[must_use]
    pub fn all_definitions(&self) -> Vec<hybridclaw_llm::LlmToolDefinition> {
        self.registry.all_definitions()
    }
}

#[async_trait]
impl hybridclaw_sandbox::ToolExecutor for BuiltinToolExecutor {
    async fn execute(&self, ctx: &TurnContext, name: &str, args: Value) -> String {
        let Some(tool) = self.registry.get(name) else {
            return format!("Error: unknown tool {name}");
        };

        eprintln!("[tool] {name}: {}", single_line_preview(&args.to_string()));
        let started = Instant::now();
        let result = tool.execute(args, &self.tool_ctx).await;
        let duration_ms = started.elapsed().as_millis();

        let text = match result {
            Ok(s) => s,
            Err(e) => format!("Error: {e}"),
        };
        eprintln!("[tool] {name} result ({duration_ms}ms): {}", single_line_preview(&text));

        let mutations = self.tool_ctx.take_schedules().await;
        if !mutations.is_empty() {
            ctx.pending_schedules.lock().expect("pending_schedules poisoned").extend(mutations);
        }

        text
    }
}
