//! `edit` — in-place string replacement in a workspace file.

use serde_json::Value;

use crate::path_safety::resolve_in_workspace;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Built-in tool for editing files via string replacement.
pub struct EditFileTool;

#[async_trait::async_trait]
impl BuiltinTool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit"
    }

    fn description(&self) -> &'static str {
        "Replaces the first `count` occurrences (default 1) of `old` with `new` in a file. \
         Fails if `old` is not found."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to edit, resolved against the workspace root"
                },
                "old": {
                    "type": "string",
                    "description": "The exact text to find and replace"
                },
                "new": {
                    "type": "string",
                    "description": "The replacement text"
                },
                "count": {
                    "type": "integer",
                    "description": "Number of leading occurrences to replace (default 1)"
                }
            },
            "required": ["path", "old", "new"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path_arg = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("path is required".into()))?;
        let old = args
            .get("old")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("old is required".into()))?;
        let new = args
            .get("new")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("new is required".into()))?;
        let count = args
            .get("count")
            .and_then(Value::as_u64)
            .map_or(1, |v| usize::try_from(v).unwrap_or(1).max(1));

        if old.is_empty() {
            return Err(ToolError::InvalidArguments("old must not be empty".into()));
        }

        let path = resolve_in_workspace(&ctx.workspace_root, path_arg)?;
        if !path.exists() {
            return Err(ToolError::PathNotFound(path_arg.to_string()));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let total = content.matches(old).count();
        if total == 0 {
            return Err(ToolError::ExecutionFailed(format!("old not found in {path_arg}")));
        }

        let replaced = total.min(count);
        let new_content = content.replacen(old, new, replaced);
        tokio::fs::write(&path, &new_content).await?;

        Ok(format!("Replaced {replaced} occurrence(s) in {path_arg}"))
    }
}
