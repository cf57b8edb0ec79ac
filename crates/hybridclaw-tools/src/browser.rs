//! The browser suite — `browser_navigate`, `browser_snapshot`, `browser_click`,
//! `browser_type`, `browser_press`, `browser_scroll`, `browser_back`,
//! `browser_screenshot`, `browser_pdf`, `browser_close`.
//!
//! Every tool sends one JSON-line command to the external browser runner
//! over a Unix socket in the session's socket directory and reads back one
//! JSON-line response, the same line-delimited-JSON idiom the container
//! mailbox uses for host/container turns. The runner itself — the process
//! that actually drives a browser — is out of scope here; this module is
//! only the client.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

const SOCKET_NAME: &str = "browser.sock";
static ARTIFACT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Send one command to the browser runner and return its `result` field as
/// text, or an error built from its `error` field.
async fn send_command(ctx: &ToolContext, op: &str, mut payload: Value) -> ToolResult {
    payload["op"] = Value::String(op.to_string());
    let socket_path = ctx.browser_socket_dir.join(SOCKET_NAME);

    let mut stream = UnixStream::connect(&socket_path)
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("browser runner unreachable: {e}")))?;

    let mut line = serde_json::to_string(&payload)
        .map_err(|e| ToolError::ExecutionFailed(format!("encoding command: {e}")))?;
    line.push('\n');
    stream
        .write_all(line.as_bytes())
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("writing to browser runner: {e}")))?;

    let mut reader = BufReader::new(stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("reading from browser runner: {e}")))?;
    if response_line.is_empty() {
        return Err(ToolError::ExecutionFailed("browser runner closed the connection".into()));
    }

    let response: Value = serde_json::from_str(response_line.trim())
        .map_err(|e| ToolError::ExecutionFailed(format!("malformed browser runner response: {e}")))?;

    if response.get("ok").and_then(Value::as_bool) == Some(true) {
        Ok(response
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    } else {
        let reason = response.get("error").and_then(Value::as_str).unwrap_or("unknown error");
        Err(ToolError::ExecutionFailed(reason.to_string()))
    }
}

/// Validate that `raw` is a navigable URL: http(s) scheme, and (unless
/// `BROWSER_ALLOW_PRIVATE_NETWORK` is set) not resolving to a loopback,
/// private, or link-local address.
async fn validate_navigable_url(raw: &str) -> Result<url::Url, ToolError> {
    let parsed = crate::web_fetch::validate_url(raw)?;

    if std::env::var("BROWSER_ALLOW_PRIVATE_NETWORK").is_ok() {
        return Ok(parsed);
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ToolError::InvalidArguments("URL has no host".into()))?;
    let port = parsed.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| ToolError::InvalidArguments(format!("DNS resolution failed: {e}")))?;

    let mut saw_any = false;
    for addr in addrs {
        saw_any = true;
        if !hybridclaw_core::is_safe_ip(addr.ip()) {
            return Err(ToolError::InvalidArguments(format!(
                "{host} resolves to a private or local address"
            )));
        }
    }
    if !saw_any {
        return Err(ToolError::InvalidArguments(format!("{host} did not resolve to any address")));
    }

    Ok(parsed)
}

fn next_artifact_path(ctx: &ToolContext, extension: &str) -> PathBuf {
    let n = ARTIFACT_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    ctx.workspace_root
        .join(".browser-artifacts")
        .join(format!("{stamp}-{n}.{extension}"))
}

macro_rules! simple_browser_tool {
    ($struct_name:ident, $tool_name:expr, $op:expr, $description:expr, $schema:expr) => {
        #[doc = $description]
        pub struct $struct_name;

        #[async_trait::async_trait]
        impl BuiltinTool for $struct_name {
            fn name(&self) -> &'static str {
                $tool_name
            }

            fn description(&self) -> &'static str {
                $description
            }

            fn input_schema(&self) -> Value {
                $schema
            }

            async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
                send_command(ctx, $op, args).await
            }
        }
    };
}

/// Built-in tool for navigating the browser to a URL.
pub struct BrowserNavigateTool;

#[async_trait::async_trait]
impl BuiltinTool for BrowserNavigateTool {
    fn name(&self) -> &'static str {
        "browser_navigate"
    }

    fn description(&self) -> &'static str {
        "Navigates the browser to a URL. Rejects private, loopback, and link-local addresses \
         unless BROWSER_ALLOW_PRIVATE_NETWORK is set."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "url": { "type": "string" } },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("url is required".into()))?;
        let validated = validate_navigable_url(url).await?;
        send_command(ctx, "navigate", serde_json::json!({ "url": validated.as_str() })).await
    }
}

simple_browser_tool!(
    BrowserSnapshotTool,
    "browser_snapshot",
    "snapshot",
    "Captures an accessibility-tree snapshot of the current page.",
    serde_json::json!({ "type": "object", "properties": {} })
);

simple_browser_tool!(
    BrowserClickTool,
    "browser_click",
    "click",
    "Clicks an element identified by selector or coordinates.",
    serde_json::json!({
        "type": "object",
        "properties": {
            "selector": { "type": "string" },
            "x": { "type": "number" },
            "y": { "type": "number" }
        }
    })
);

simple_browser_tool!(
    BrowserTypeTool,
    "browser_type",
    "type",
    "Types text into the focused element.",
    serde_json::json!({
        "type": "object",
        "properties": { "text": { "type": "string" } },
        "required": ["text"]
    })
);

simple_browser_tool!(
    BrowserPressTool,
    "browser_press",
    "press",
    "Presses a key, optionally with modifiers.",
    serde_json::json!({
        "type": "object",
        "properties": {
            "key": { "type": "string" },
            "modifiers": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["key"]
    })
);

simple_browser_tool!(
    BrowserScrollTool,
    "browser_scroll",
    "scroll",
    "Scrolls an element into view, or the page by a pixel delta.",
    serde_json::json!({
        "type": "object",
        "properties": {
            "selector": { "type": "string" },
            "dx": { "type": "number" },
            "dy": { "type": "number" }
        }
    })
);

simple_browser_tool!(
    BrowserBackTool,
    "browser_back",
    "back",
    "Navigates the browser back one entry in its history.",
    serde_json::json!({ "type": "object", "properties": {} })
);

simple_browser_tool!(
    BrowserCloseTool,
    "browser_close",
    "close",
    "Closes the browser runner's current page.",
    serde_json::json!({ "type": "object", "properties": {} })
);

/// Built-in tool for saving a screenshot under `.browser-artifacts`.
pub struct BrowserScreenshotTool;

#[async_trait::async_trait]
impl BuiltinTool for BrowserScreenshotTool {
    fn name(&self) -> &'static str {
        "browser_screenshot"
    }

    fn description(&self) -> &'static str {
        "Captures a screenshot of the current page, saved under .browser-artifacts."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path = next_artifact_path(ctx, "png");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut payload = args;
        payload["outputPath"] = Value::String(path.display().to_string());
        send_command(ctx, "screenshot", payload).await?;
        Ok(path
            .strip_prefix(&ctx.workspace_root)
            .unwrap_or(&path)
            .display()
            .to_string())
    }
}

/// Built-in tool for saving a PDF under `.browser-artifacts`.
pub struct BrowserPdfTool;

#[async_trait::async_trait]
impl BuiltinTool for BrowserPdfTool {
    fn name(&self) -> &'static str {
        "browser_pdf"
    }

    fn description(&self) -> &'static str {
        "Renders the current page to a PDF, saved under .browser-artifacts."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let path = next_artifact_path(ctx, "pdf");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut payload = args;
        payload["outputPath"] = Value::String(path.display().to_string());
        send_command(ctx, "pdf", payload).await?;
        Ok(path
            .strip_prefix(&ctx.workspace_root)
            .unwrap_or(&path)
            .display()
            .to_string())
    }
}
