//! `memory` — reads and mutates the project's persistent memory files:
//! `MEMORY.md`, `USER.md`, and dated `memory/YYYY-MM-DD.md` logs.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

static DATED_LOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^memory/\d{4}-\d{2}-\d{2}\.md$").expect("valid regex"));

/// Per-file character caps.
fn char_limit(file: &str) -> usize {
    match file {
        "MEMORY.md" => 12_000,
        "USER.md" => 8_000,
        _ => 24_000,
    }
}

fn validate_file(file: &str) -> Result<(), ToolError> {
    if file == "MEMORY.md" || file == "USER.md" || DATED_LOG.is_match(file) {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "{file} is not a memory file (must be MEMORY.md, USER.md, or memory/YYYY-MM-DD.md)"
        )))
    }
}

/// Built-in tool for reading and writing project memory.
pub struct MemoryTool;

#[async_trait::async_trait]
impl BuiltinTool for MemoryTool {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn description(&self) -> &'static str {
        "Reads, appends to, writes, edits, or lists the project's persistent memory: MEMORY.md, \
         USER.md, or a dated memory/YYYY-MM-DD.md log. Actions: read, append, write, replace, \
         remove, list, search."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["read", "append", "write", "replace", "remove", "list", "search"]
                },
                "file": {
                    "type": "string",
                    "description": "MEMORY.md, USER.md, or memory/YYYY-MM-DD.md"
                },
                "content": { "type": "string" },
                "old": { "type": "string" },
                "new": { "type": "string" },
                "query": { "type": "string" }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let action = args
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("action is required".into()))?;

        match action {
            "list" => list(ctx).await,
            "search" => {
                let query = args
                    .get("query")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ToolError::InvalidArguments("query is required".into()))?;
                search(ctx, query).await
            }
            "read" => read(ctx, file_arg(&args)?).await,
            "append" => {
                let content = str_arg(&args, "content")?;
                append(ctx, file_arg(&args)?, content).await
            }
            "write" => {
                let content = str_arg(&args, "content")?;
                write(ctx, file_arg(&args)?, content).await
            }
            "replace" => {
                let old = str_arg(&args, "old")?;
                let new = str_arg(&args, "new")?;
                replace_or_remove(ctx, file_arg(&args)?, old, Some(new)).await
            }
            "remove" => {
                let old = str_arg(&args, "old")?;
                replace_or_remove(ctx, file_arg(&args)?, old, None).await
            }
            other => Err(ToolError::InvalidArguments(format!("unknown memory action: {other}"))),
        }
    }
}

fn file_arg(args: &Value) -> Result<&str, ToolError> {
    let file = args
        .get("file")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments("file is required".into()))?;
    validate_file(file)?;
    Ok(file)
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("{key} is required")))
}

async fn read(ctx: &ToolContext, file: &str) -> ToolResult {
    let path = ctx.workspace_root.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write(ctx: &ToolContext, file: &str, content: &str) -> ToolResult {
    if content.len() > char_limit(file) {
        return Err(ToolError::InvalidArguments(format!(
            "{file} content exceeds its {}-character limit",
            char_limit(file)
        )));
    }
    let path = ctx.workspace_root.join(file);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, content).await?;
    Ok(format!("Wrote {file}"))
}

async fn append(ctx: &ToolContext, file: &str, content: &str) -> ToolResult {
    let normalized = normalize_whitespace(content);
    let existing = read(ctx, file).await?;
    let joined = if existing.trim().is_empty() {
        format!("{normalized}\n")
    } else {
        format!("{}\n\n{normalized}\n", existing.trim_end())
    };

    if joined.len() > char_limit(file) {
        return Err(ToolError::InvalidArguments(format!(
            "appending to {file} would exceed its {}-character limit",
            char_limit(file)
        )));
    }

    let path = ctx.workspace_root.join(file);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &joined).await?;
    Ok(format!("Appended to {file}"))
}

/// Collapse runs of whitespace to single spaces, preserving paragraph breaks,
/// and trim the result.
fn normalize_whitespace(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

async fn replace_or_remove(ctx: &ToolContext, file: &str, old: &str, new: Option<&str>) -> ToolResult {
    let existing = read(ctx, file).await?;
    if !existing.contains(old) {
        return Err(ToolError::ExecutionFailed(format!("{old:?} not found in {file}")));
    }
    let updated = existing.replacen(old, new.unwrap_or(""), 1);
    if updated.len() > char_limit(file) {
        return Err(ToolError::InvalidArguments(format!(
            "editing {file} would exceed its {}-character limit",
            char_limit(file)
        )));
    }
    tokio::fs::write(ctx.workspace_root.join(file), &updated).await?;
    Ok(format!(
        "{} in {file}",
        if new.is_some() { "Replaced" } else { "Removed" }
    ))
}

async fn list(ctx: &ToolContext) -> ToolResult {
    let mut files = Vec::new();
    for candidate in ["MEMORY.md", "USER.md"] {
        if ctx.workspace_root.join(candidate).exists() {
            files.push(candidate.to_string());
        }
    }
    let memory_dir = ctx.workspace_root.join("memory");
    if let Ok(mut entries) = tokio::fs::read_dir(&memory_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(name) = entry.file_name().to_str() {
                if DATED_LOG.is_match(&format!("memory/{name}")) {
                    files.push(format!("memory/{name}"));
                }
            }
        }
    }
    files.sort();
    if files.is_empty() {
        Ok("(no memory files yet)".to_string())
    } else {
        Ok(files.join("\n"))
    }
}

async fn search(ctx: &ToolContext, query: &str) -> ToolResult {
    let mut hits = Vec::new();
    let list_result = list(ctx).await?;
    if list_result == "(no memory files yet)" {
        return Ok(list_result);
    }
    for file in list_result.lines() {
        let content = read(ctx, file).await.unwrap_or_default();
        for (idx, line) in content.lines().enumerate() {
            if line.contains(query) {
                hits.push(format!("{file}:{}:{line}", idx + 1));
            }
        }
    }
    if hits.is_empty() {
        Ok(format!("No matches for {query:?}"))
    } else {
        Ok(hits.join("\n"))
    }
}
