//! `glob` — finds files under the workspace matching a glob pattern.

use std::fmt::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use serde_json::Value;
use walkdir::WalkDir;

use crate::path_safety::resolve_in_workspace;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Maximum number of matches returned.
const MAX_MATCHES: usize = 50;

/// Built-in tool for finding files by glob pattern.
pub struct GlobTool;

#[async_trait::async_trait]
impl BuiltinTool for GlobTool {
    fn name(&self) -> &'static str {
        "glob"
    }

    fn description(&self) -> &'static str {
        "Finds up to 50 files under the workspace matching a glob pattern \
         (e.g. \"**/*.rs\", \"src/**/*.ts\"), sorted by modification time, most recent first. \
         Paths are returned relative to the workspace root."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to match files against"
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

        let root = resolve_in_workspace(&ctx.workspace_root, ".")?;
        if !root.exists() {
            return Err(ToolError::PathNotFound(root.display().to_string()));
        }

        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|e| ToolError::InvalidArguments(format!("invalid glob pattern: {e}")))?
            .compile_matcher();

        let mut matches: Vec<(PathBuf, SystemTime)> = Vec::new();

        for entry in WalkDir::new(&root).follow_links(false).into_iter().filter_entry(|e| {
            e.depth() == 0 || e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
        }) {
            let Ok(entry) = entry else { continue };
            if entry.file_type().is_dir() {
                continue;
            }

            let rel_path = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if glob.is_match(rel_path) {
                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                matches.push((rel_path.to_path_buf(), mtime));
            }
        }

        matches.sort_by(|a, b| b.1.cmp(&a.1));
        let total = matches.len();
        matches.truncate(MAX_MATCHES);

        if matches.is_empty() {
            return Ok(format!("No files matching \"{pattern}\" found"));
        }

        let mut output = String::new();
        for (path, _) in &matches {
            output.push_str(&path.display().to_string());
            output.push('\n');
        }
        let _ = write!(output, "\n({} of {total} files matched)", matches.len());
        Ok(output)
    }
}
