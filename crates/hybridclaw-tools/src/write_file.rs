//! `write` — writes bytes to a file, auto-creating parent directories.

use serde_json::Value;

use crate::path_safety::resolve_in_workspace;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Built-in tool for writing files.
pub struct WriteFileTool;

#[async_trait::async_trait]
impl BuiltinTool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write"
    }

    fn description(&self) -> &'static str {
        "Writes content to a file under the workspace. Creates parent directories if needed. \
         Overwrites the file if it already exists."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to write, resolved against the workspace root"
                },
                "contents": {
                    "type": "string",
                    "description": "The content to write to the file"
                }
            },
            "required": ["path", "contents"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path_arg = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("path is required".into()))?;
        let contents = args
            .get("contents")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("contents is required".into()))?;

        let path = resolve_in_workspace(&ctx.workspace_root, path_arg)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;

        Ok(format!("Wrote {} bytes to {path_arg}", contents.len()))
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
    async fn writes_file_contents() {
        let dir = TempDir::new().unwrap();
        WriteFileTool
            .execute(
                serde_json::json!({"path": "a.txt", "contents": "hello"}),
                &ctx_with_root(dir.path()),
            )
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        WriteFileTool
            .execute(
                serde_json::json!({"path": "a/b/c.txt", "contents": "nested"}),
                &ctx_with_root(dir.path()),
            )
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a/b/c.txt")).unwrap(),
            "nested"
        );
    }

    #[tokio::test]
    async fn rejects_paths_outside_workspace() {
        let dir = TempDir::new().unwrap();
        let result = WriteFileTool
            .execute(
                serde_json::json!({"path": "../escape.txt", "contents": "x"}),
                &ctx_with_root(dir.path()),
            )
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
