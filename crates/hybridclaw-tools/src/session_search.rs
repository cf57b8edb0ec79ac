//! `session_search` — searches past session transcripts under
//! `.session-transcripts/*.jsonl` for lines relevant to a query.

use std::fmt::Write;

use serde_json::Value;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

const MAX_RESULTS: usize = 5;
const MAX_SNIPPETS: usize = 3;
const TRANSCRIPT_DIR: &str = ".session-transcripts";

struct SessionHit {
    session_id: String,
    score: usize,
    snippets: Vec<String>,
}

/// Built-in tool for searching past session transcripts by keyword.
pub struct SessionSearchTool;

#[async_trait::async_trait]
impl BuiltinTool for SessionSearchTool {
    fn name(&self) -> &'static str {
        "session_search"
    }

    fn description(&self) -> &'static str {
        "Searches past session transcripts for a query, returning up to 5 matching sessions \
         with a summary and snippets each. By default excludes the current session; set \
         include_current to search it too. Optionally filter by message role."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer", "description": "Max sessions to return (default 5, max 5)" },
                "role_filter": { "type": "string", "description": "Only match messages from this role" },
                "include_current": { "type": "boolean", "description": "Include the current session (default false)" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("query is required".into()))?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArguments("query must not be empty".into()));
        }

        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(MAX_RESULTS, |n| (n as usize).clamp(1, MAX_RESULTS));
        let role_filter = args.get("role_filter").and_then(Value::as_str);
        let include_current = args.get("include_current").and_then(Value::as_bool).unwrap_or(false);

        let current_session_id = ctx.current_session_id().await;
        let dir = ctx.workspace_root.join(TRANSCRIPT_DIR);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok("No session transcripts found".to_string());
            }
            Err(e) => return Err(e.into()),
        };

        let mut hits = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("jsonl") {
                continue;
            }
            let Some(session_id) = path.file_stem().and_then(std::ffi::OsStr::to_str) else {
                continue;
            };

            if !include_current {
                if let Some(current) = current_session_id.as_deref() {
                    if session_id == current {
                        continue;
                    }
                }
            }

            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };

            if let Some(hit) = score_transcript(session_id, &content, query, role_filter) {
                hits.push(hit);
            }
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);

        if hits.is_empty() {
            return Ok(format!("No sessions matched {query:?}"));
        }

        let mut output = String::new();
        for hit in &hits {
            let _ = writeln!(
                output,
                "## session {} ({} match(es))",
                hit.session_id, hit.score
            );
            for snippet in &hit.snippets {
                let _ = writeln!(output, "  {snippet}");
            }
        }
        Ok(output.trim_end().to_string())
    }
}

/// Score a transcript against `query`, term by term, and collect the first
/// few matching snippets. Returns `None` if nothing matched.
fn score_transcript(
    session_id: &str,
    content: &str,
    query: &str,
    role_filter: Option<&str>,
) -> Option<SessionHit> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return None;
    }

    let mut score = 0usize;
    let mut snippets = Vec::new();

    for line in content.lines() {
        let Ok(record) = serde_json::from_str::<Value>(line) else { continue };

        if let Some(role) = role_filter {
            if record.get("role").and_then(Value::as_str) != Some(role) {
                continue;
            }
        }

        let Some(text) = record.get("content").and_then(Value::as_str) else { continue };
        let lower = text.to_lowercase();

        let matched_terms = terms.iter().filter(|t| lower.contains(t.as_str())).count();
        if matched_terms == 0 {
            continue;
        }

        score += matched_terms;
        if snippets.len() < MAX_SNIPPETS {
            let role = record.get("role").and_then(Value::as_str).unwrap_or("?");
            let snippet = if text.len() > 160 { &text[..160] } else { text };
            snippets.push(format!("[{role}] {snippet}"));
        }
    }

    if score == 0 {
        None
    } else {
        Some(SessionHit {
            session_id: session_id.to_string(),
            score,
            snippets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx_with_root(root: &std::path::Path) -> ToolContext {
        ToolContext::new(root.to_path_buf(), root.to_path_buf())
    }

    fn write_transcript(root: &std::path::Path, session_id: &str, lines: &[(&str, &str)]) {
        let dir = root.join(".session-transcripts");
        std::fs::create_dir_all(&dir).unwrap();
        let body = lines
            .iter()
            .map(|(role, content)| serde_json::json!({"role": role, "content": content}).to_string())
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(dir.join(format!("{session_id}.jsonl")), body).unwrap();
    }

    #[tokio::test]
    async fn finds_matching_session_with_snippet() {
        let dir = TempDir::new().unwrap();
        write_transcript(
            dir.path(),
            "sess-a",
            &[("user", "how do I configure the database pool")],
        );

        let result = SessionSearchTool
            .execute(serde_json::json!({"query": "database pool"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();

        assert!(result.contains("sess-a"));
        assert!(result.contains("database pool"));
    }

    #[tokio::test]
    async fn excludes_current_session_by_default() {
        let dir = TempDir::new().unwrap();
        write_transcript(dir.path(), "sess-current", &[("user", "database migration plan")]);
        let ctx = ctx_with_root(dir.path());
        ctx.set_current_session(Some("sess-current".to_string())).await;

        let result = SessionSearchTool
            .execute(serde_json::json!({"query": "database"}), &ctx)
            .await
            .unwrap();
        assert!(result.contains("No sessions matched"));

        let result = SessionSearchTool
            .execute(serde_json::json!({"query": "database", "include_current": true}), &ctx)
            .await
            .unwrap();
        assert!(result.contains("sess-current"));
    }

    #[tokio::test]
    async fn respects_role_filter() {
        let dir = TempDir::new().unwrap();
        write_transcript(
            dir.path(),
            "sess-b",
            &[
                ("user", "tell me about rust lifetimes"),
                ("assistant", "lifetimes describe how long references are valid"),
            ],
        );

        let result = SessionSearchTool
            .execute(
                serde_json::json!({"query": "lifetimes", "role_filter": "assistant"}),
                &ctx_with_root(dir.path()),
            )
            .await
            .unwrap();
        assert!(result.contains("[assistant]"));
        assert!(!result.contains("[user]"));
    }

    #[tokio::test]
    async fn caps_results_at_limit() {
        let dir = TempDir::new().unwrap();
        for i in 0..8 {
            write_transcript(dir.path(), &format!("sess-{i}"), &[("user", "widget widget widget")]);
        }

        let result = SessionSearchTool
            .execute(serde_json::json!({"query": "widget", "limit": 2}), &ctx_with_root(dir.path()))
            .await
            .unwrap();
        assert_eq!(result.matches("## session").count(), 2);
    }

    #[tokio::test]
    async fn no_transcripts_directory_reports_empty() {
        let dir = TempDir::new().unwrap();
        let result = SessionSearchTool
            .execute(serde_json::json!({"query": "anything"}), &ctx_with_root(dir.path()))
            .await
            .unwrap();
        assert!(result.contains("No session transcripts"));
    }
}
