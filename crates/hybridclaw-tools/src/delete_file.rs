//! `delete` — unlinks a workspace file.

use serde_json::Value;

use crate::path_safety::resolve_in_workspace;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Built-in tool for deleting files.
pub struct DeleteFileTool;

#[async_trait::async_trait]
impl BuiltinTool for DeleteFileTool {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn description(&self) -> &'static str {
        "Deletes a file from the workspace. Fails if the file does not exist."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to delete, resolved against the workspace root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path_arg = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("path is required".into()))?;

        let path = resolve_in_workspace(&ctx.workspace_root, path_arg)?;
        if !path.exists() {
            return Err(ToolError::PathNotFound(path_arg.to_string()));
        }

        tokio::fs::remove_file(&path).await?;
        Ok(format!("Deleted {path_arg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx_with_root(root: &std::path::Path) -> ToolContext {
        ToolContext::new(root.to_path_buf(), root.to_path_buf())
    }

    #[tokio::test]
    async fn deletes_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        DeleteFileTool
            .execute(serde_json::json!({"path": "a.txt"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let result = DeleteFileTool
            .execute(serde_json::json!({"path": "missing.txt"}), &ctx_with_root(dir.path()))
            .await;
        assert!(matches!(result, Err(ToolError::PathNotFound(_))));
    }
}
