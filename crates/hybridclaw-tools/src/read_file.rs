//! `read` — reads a file from the workspace with line numbers (cat -n style).

use std::fmt::Write;

use serde_json::Value;

use crate::path_safety::resolve_in_workspace;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Lines shown by default, and the hard cap regardless of `limit`.
const MAX_LINES: usize = 2000;
/// Byte cap on the returned content, independent of the line cap.
const MAX_BYTES: usize = 50 * 1024;
/// A single line longer than this refuses outright rather than truncating.
const MAX_LINE_BYTES: usize = 2000;

/// Built-in tool for reading files.
pub struct ReadFileTool;

#[async_trait::async_trait]
impl BuiltinTool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read"
    }

    fn description(&self) -> &'static str {
        "Reads a file from the workspace. Returns contents with line numbers (cat -n format). \
         Default reads up to 2000 lines or 50KiB, whichever comes first. Use offset and limit \
         for large files."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to read, resolved against the workspace root"
                },
                "offset": {
                    "type": "integer",
                    "description": "1-based line number to start reading from"
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of lines to read (capped at 2000)"
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

        let offset = args.get("offset").and_then(Value::as_u64).map(|v| {
            if v == 0 {
                1
            } else {
                v
            }
        });
        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(MAX_LINES, |v| usize::try_from(v).unwrap_or(MAX_LINES).min(MAX_LINES));

        let path = resolve_in_workspace(&ctx.workspace_root, path_arg)?;
        if !path.exists() {
            return Err(ToolError::PathNotFound(path_arg.to_string()));
        }

        let raw = tokio::fs::read(&path).await?;
        let check_len = raw.len().min(8192);
        if raw[..check_len].contains(&0) {
            return Err(ToolError::ExecutionFailed(format!("{path_arg} appears to be a binary file")));
        }
        let content = String::from_utf8(raw)
            .map_err(|_| ToolError::ExecutionFailed(format!("{path_arg} is not valid UTF-8")))?;

        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();
        let start = offset.map_or(0, |o| usize::try_from(o - 1).unwrap_or(usize::MAX));

        if start >= total_lines {
            return Ok(format!("(file has {total_lines} lines, offset {start} is past end)"));
        }

        let window_end = start.saturating_add(limit).min(total_lines);

        for (idx, line) in lines[start..window_end].iter().enumerate() {
            if line.len() > MAX_LINE_BYTES {
                let line_num = start + idx + 1;
                return Err(ToolError::ExecutionFailed(format!(
                    "line {line_num} of {path_arg} is {} bytes, too long to display; \
                     use `sed -n '{line_num}p' {path_arg}` to view it directly",
                    line.len()
                )));
            }
        }

        let mut output = String::new();
        let mut end = start;
        for (idx, line) in lines[start..window_end].iter().enumerate() {
            let mut rendered = String::new();
            let line_num = start + idx + 1;
            let _ = writeln!(rendered, "{line_num:>6}\t{line}");
            if output.len() + rendered.len() > MAX_BYTES {
                break;
            }
            output.push_str(&rendered);
            end = line_num;
        }

        if end < total_lines {
            let _ = write!(
                output,
                "\n(showing lines {}-{end} of {total_lines}; pass offset={} to continue)",
                start + 1,
                end + 1
            );
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::{NamedTempFile, TempDir};

    fn ctx_with_root(root: &std::path::Path) -> ToolContext {
        ToolContext::new(root.to_path_buf(), root.to_path_buf())
    }

    #[tokio::test]
    async fn reads_file_with_line_numbers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();

        let result = ReadFileTool
            .execute(serde_json::json!({"path": "a.txt"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(result.contains("     1\tone"));
        assert!(result.contains("     3\tthree"));
    }

    #[tokio::test]
    async fn missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let result = ReadFileTool
            .execute(serde_json::json!({"path": "missing.txt"}), &ctx_with_root(dir.path()))
            .await;
        assert!(matches!(result, Err(ToolError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn offset_and_limit_select_a_window() {
        let dir = TempDir::new().unwrap();
        let mut f = std::fs::File::create(dir.path().join("big.txt")).unwrap();
        for i in 1..=20 {
            writeln!(f, "line {i}").unwrap();
        }

        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": "big.txt", "offset": 5, "limit": 3}),
                &ctx_with_root(dir.path()),
            )
            .await
            .unwrap();

        assert!(result.contains("line 5"));
        assert!(result.contains("line 7"));
        assert!(!result.contains("line 8"));
    }

    #[tokio::test]
    async fn truncation_reports_next_offset() {
        let dir = TempDir::new().unwrap();
        let mut f = std::fs::File::create(dir.path().join("big.txt")).unwrap();
        for i in 1..=2100 {
            writeln!(f, "line {i}").unwrap();
        }

        let result = ReadFileTool
            .execute(serde_json::json!({"path": "big.txt"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(result.contains("pass offset=2001 to continue"));
    }

    #[tokio::test]
    async fn oversized_line_refuses_with_sed_hint() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "{}", "x".repeat(3000)).unwrap();

        let result = ReadFileTool
            .execute(
                serde_json::json!({"path": f.path().to_str().unwrap()}),
                &ctx_with_root(&std::env::temp_dir()),
            )
            .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("sed -n"));
    }

    #[tokio::test]
    async fn rejects_paths_outside_workspace() {
        let dir = TempDir::new().unwrap();
        let result = ReadFileTool
            .execute(serde_json::json!({"path": "/etc/passwd"}), &ctx_with_root(dir.path()))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
