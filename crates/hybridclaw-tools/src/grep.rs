//! `grep` — searches workspace files for a regex pattern.

use std::fmt::Write;

use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::path_safety::resolve_in_workspace;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Maximum number of matches returned.
const MAX_MATCHES: usize = 30;

/// Built-in tool for searching file contents by regex.
pub struct GrepTool;

#[async_trait::async_trait]
impl BuiltinTool for GrepTool {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn description(&self) -> &'static str {
        "Searches workspace files for a regex pattern. Returns up to 30 matches with line \
         numbers. Optionally scope the search to a file or directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search (defaults to the workspace root)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let pattern = args
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("pattern is required".into()))?;

        let search_root = resolve_in_workspace(
            &ctx.workspace_root,
            args.get("path").and_then(Value::as_str).unwrap_or("."),
        )?;

        if !search_root.exists() {
            return Err(ToolError::PathNotFound(search_root.display().to_string()));
        }

        let re = Regex::new(pattern).map_err(|e| ToolError::InvalidArguments(format!("invalid pattern: {e}")))?;

        let mut matches = Vec::new();
        'files: for entry in WalkDir::new(&search_root).follow_links(false).into_iter().filter_entry(|e| {
            e.depth() == 0 || e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
        }) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(content) = std::fs::read_to_string(entry.path()) else { continue };
            let rel_path = entry.path().strip_prefix(&ctx.workspace_root).unwrap_or(entry.path());

            for (idx, line) in content.lines().enumerate() {
                if re.is_match(line) {
                    matches.push(format!("{}:{}:{line}", rel_path.display(), idx + 1));
                    if matches.len() >= MAX_MATCHES {
                        break 'files;
                    }
                }
            }
        }

        if matches.is_empty() {
            return Ok(format!("No matches for \"{pattern}\""));
        }

        let mut output = matches.join("\n");
        let _ = write!(output, "\n\n({} match(es))", matches.len());
        Ok(output)
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
    async fn finds_matching_lines_with_numbers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello\nworld\nhello again\n").unwrap();

        let result = GrepTool
            .execute(serde_json::json!({"pattern": "hello"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(result.contains("a.txt:1:hello"));
        assert!(result.contains("a.txt:3:hello again"));
        assert!(result.contains("2 match(es)"));
    }

    #[tokio::test]
    async fn caps_at_thirty_matches() {
        let dir = TempDir::new().unwrap();
        let content = "match\n".repeat(40);
        std::fs::write(dir.path().join("a.txt"), content).unwrap();

        let result = GrepTool
            .execute(serde_json::json!({"pattern": "match"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(result.contains("30 match(es)"));
    }

    #[tokio::test]
    async fn no_matches_reports_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "nothing here").unwrap();

        let result = GrepTool
            .execute(serde_json::json!({"pattern": "zzz"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(result.contains("No matches"));
    }
}
