//! `bash` — executes shell commands with a persistent working directory,
//! gated by the deny-list in [`crate::deny_list`].

use std::path::PathBuf;

use serde_json::Value;
use tokio::process::Command;

use crate::deny_list;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

const DEFAULT_TIMEOUT_MS: u64 = 4 * 60 * 1000;
const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 15 * 60 * 1000;
const MAX_OUTPUT_LINES: usize = 400;
const MAX_OUTPUT_BYTES: usize = 128 * 1024;
const CWD_SENTINEL: &str = "__HYBRIDCLAW_CWD__";

/// Built-in tool for executing shell commands.
pub struct BashTool;

#[async_trait::async_trait]
impl BuiltinTool for BashTool {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn description(&self) -> &'static str {
        "Executes a bash command under the workspace root. The working directory persists \
         between invocations. Never use this to write files — use the write/edit tools instead. \
         Optional timeoutMs, 1000-900000 (default 240000)."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute"
                },
                "timeoutMs": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (default 240000, min 1000, max 900000)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("command is required".into()))?;

        if let Some(reason) = deny_list::check(command) {
            tracing::warn!(reason, "bash command blocked by deny-list");
            return Ok(deny_list::BLOCKED_MESSAGE.to_string());
        }

        let timeout_ms = args
            .get("timeoutMs")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_MS)
            .clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);

        let cwd = ctx.cwd.read().await.clone();
        let wrapped = format!(
            "{command}\n__HYBRIDCLAW_EXIT__=$?\necho \"{CWD_SENTINEL}\"\npwd\nexit $__HYBRIDCLAW_EXIT__"
        );

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            run_bash(&wrapped, &cwd),
        )
        .await;

        match result {
            Ok(Ok((stdout, stderr, exit_code))) => {
                let (output, new_cwd) = parse_sentinel_output(&stdout);
                if let Some(new_cwd) = new_cwd {
                    *ctx.cwd.write().await = new_cwd;
                }

                let mut result_text = String::new();
                if !output.is_empty() {
                    result_text.push_str(&output);
                }
                if !stderr.is_empty() {
                    if !result_text.is_empty() {
                        result_text.push('\n');
                    }
                    result_text.push_str("STDERR:\n");
                    result_text.push_str(&stderr);
                }
                if exit_code != 0 {
                    if !result_text.is_empty() {
                        result_text.push('\n');
                    }
                    result_text.push_str(&format!("(exit code: {exit_code})"));
                }
                if result_text.is_empty() {
                    result_text.push_str("(no output)");
                }

                Ok(truncate_output(result_text))
            }
            Ok(Err(e)) => Err(ToolError::ExecutionFailed(e.to_string())),
            Err(_) => Err(ToolError::Timeout(timeout_ms)),
        }
    }
}

/// Run a bash command with the API key stripped from the environment and
/// capture stdout, stderr, and exit code. `is_blocked_spawn_env` is for
/// container-pool spawns with a constrained config-driven env, not this
/// tool's inherited shell environment, so it isn't applied here.
async fn run_bash(command: &str, cwd: &std::path::Path) -> std::io::Result<(String, String, i32)> {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command).current_dir(cwd).env_clear();
    for (key, value) in std::env::vars() {
        if !key.to_uppercase().contains("API_KEY") {
            cmd.env(key, value);
        }
    }

    let output = cmd.output().await?;
    Ok((
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    ))
}

fn parse_sentinel_output(stdout: &str) -> (String, Option<PathBuf>) {
    if let Some(sentinel_pos) = stdout.find(CWD_SENTINEL) {
        let output = stdout[..sentinel_pos].trim_end().to_string();
        let after = &stdout[sentinel_pos.saturating_add(CWD_SENTINEL.len())..];
        let new_cwd = after.lines().find(|l| !l.is_empty()).map(|l| PathBuf::from(l.trim()));
        (output, new_cwd)
    } else {
        (stdout.to_string(), None)
    }
}

/// Truncate to at most 400 lines and 128KiB, whichever comes first.
fn truncate_output(text: String) -> String {
    let (mut result, truncated) =
        hybridclaw_core::truncate_to_boundary(&text, MAX_OUTPUT_LINES, MAX_OUTPUT_BYTES);
    if truncated {
        result.push_str("\n(output truncated at 400 lines / 128KiB)");
    }
    result
}
