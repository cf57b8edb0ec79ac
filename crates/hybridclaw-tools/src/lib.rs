#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Built-in tool executors run inside each session's sandbox container.
//!
//! Each tool is a direct Rust implementation of one row of the tool
//! contract table: file I/O, search, shell execution, project memory,
//! session search, web fetch, cron mutation, and the browser suite. None
//! of this crate's tools know about the turn loop that dispatches them —
//! [`hybridclaw_sandbox::ToolExecutor`] is implemented by the host binary,
//! which looks names up in a [`ToolRegistry`] and calls [`BuiltinTool::execute`].

mod bash;
mod browser;
mod cron_tool;
mod delete_file;
mod deny_list;
mod edit_file;
mod glob;
mod grep;
mod memory;
mod path_safety;
mod read_file;
mod session_search;
mod truncate;
mod web_fetch;
mod write_file;

pub use bash::BashTool;
pub use browser::{
    BrowserBackTool, BrowserClickTool, BrowserCloseTool, BrowserNavigateTool, BrowserPdfTool,
    BrowserPressTool, BrowserScreenshotTool, BrowserScrollTool, BrowserSnapshotTool,
    BrowserTypeTool,
};
pub use cron_tool::CronTool;
pub use delete_file::DeleteFileTool;
pub use edit_file::EditFileTool;
pub use glob::GlobTool;
pub use grep::GrepTool;
pub use memory::MemoryTool;
pub use read_file::ReadFileTool;
pub use session_search::SessionSearchTool;
pub use truncate::truncate_at_char_boundary;
pub use web_fetch::WebFetchTool;
pub use write_file::WriteFileTool;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use web_fetch::FetchCache;

/// A built-in tool that executes directly in-process.
#[async_trait::async_trait]
pub trait BuiltinTool: Send + Sync {
    /// Tool name, as offered to the model.
    fn name(&self) -> &'static str;

    /// Human-readable description for the LLM.
    fn description(&self) -> &'static str;

    /// JSON schema for tool input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult;
}

/// Shared context available to every built-in tool, constructed once per
/// container and reused across every turn (the things it holds, like the
/// bash cwd and the web-fetch cache, are meant to persist across turns).
pub struct ToolContext {
    /// Workspace root directory; every file-tool path resolves against this.
    pub workspace_root: PathBuf,
    /// Current working directory for `bash`, persisted across invocations.
    pub cwd: Arc<RwLock<PathBuf>>,
    /// Directory holding this session's browser-runner socket.
    pub browser_socket_dir: PathBuf,
    pending_schedules: Mutex<Vec<Value>>,
    fetch_cache: FetchCache,
    current_session_id: RwLock<Option<String>>,
    injected_tasks: RwLock<Vec<Value>>,
}

impl ToolContext {
    /// Create a new tool context rooted at `workspace_root`, with the
    /// browser runner's socket directory at `browser_socket_dir`.
    #[must_use]
    pub fn new(workspace_root: PathBuf, browser_socket_dir: PathBuf) -> Self {
        let cwd = Arc::new(RwLock::new(workspace_root.clone()));
        Self {
            workspace_root,
            cwd,
            browser_socket_dir,
            pending_schedules: Mutex::new(Vec::new()),
            fetch_cache: FetchCache::new(),
            current_session_id: RwLock::new(None),
            injected_tasks: RwLock::new(Vec::new()),
        }
    }

    /// Set the session id for the turn about to run, so `session_search` can
    /// tell the current session's transcript apart from past ones.
    pub async fn set_current_session(&self, session_id: Option<String>) {
        *self.current_session_id.write().await = session_id;
    }

    /// The session id set by [`Self::set_current_session`], if any.
    pub(crate) async fn current_session_id(&self) -> Option<String> {
        self.current_session_id.read().await.clone()
    }

    /// Set the read-only view of currently-scheduled tasks for this turn, so
    /// `cron list` has something to format.
    pub async fn set_injected_tasks(&self, tasks: Vec<Value>) {
        *self.injected_tasks.write().await = tasks;
    }

    /// The tasks set by [`Self::set_injected_tasks`].
    pub(crate) async fn injected_tasks(&self) -> Vec<Value> {
        self.injected_tasks.read().await.clone()
    }

    /// Record a `cron` mutation for the host to resolve after the turn.
    async fn push_schedule(&self, mutation: Value) {
        self.pending_schedules.lock().await.push(mutation);
    }

    /// Drain every `cron` mutation recorded this turn, leaving it empty.
    pub async fn take_schedules(&self) -> Vec<Value> {
        std::mem::take(&mut *self.pending_schedules.lock().await)
    }
}

/// Tool execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Path not found.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Timeout.
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// Result type for tool execution.
pub type ToolResult = Result<String, ToolError>;

/// Registry of built-in tools for lookup and LLM definition export.
pub struct ToolRegistry {
    tools: std::collections::HashMap<&'static str, Box<dyn BuiltinTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: std::collections::HashMap::new(),
        }
    }

    /// Create a registry with every built-in tool registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(WriteFileTool));
        registry.register(Box::new(EditFileTool));
        registry.register(Box::new(DeleteFileTool));
        registry.register(Box::new(GlobTool));
        registry.register(Box::new(GrepTool));
        registry.register(Box::new(BashTool));
        registry.register(Box::new(MemoryTool));
        registry.register(Box::new(SessionSearchTool));
        registry.register(Box::new(WebFetchTool));
        registry.register(Box::new(CronTool));
        registry.register(Box::new(BrowserNavigateTool));
        registry.register(Box::new(BrowserSnapshotTool));
        registry.register(Box::new(BrowserClickTool));
        registry.register(Box::new(BrowserTypeTool));
        registry.register(Box::new(BrowserPressTool));
        registry.register(Box::new(BrowserScrollTool));
        registry.register(Box::new(BrowserBackTool));
        registry.register(Box::new(BrowserScreenshotTool));
        registry.register(Box::new(BrowserPdfTool));
        registry.register(Box::new(BrowserCloseTool));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn BuiltinTool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn BuiltinTool> {
        self.tools.get(name).map(AsRef::as_ref)
    }

    /// Export every registered tool's definition for the LLM.
    #[must_use]
    pub fn all_definitions(&self) -> Vec<hybridclaw_llm::LlmToolDefinition> {
        self.tools
            .values()
            .map(|t| {
                hybridclaw_llm::LlmToolDefinition::new(t.name())
                    .with_description(t.description())
                    .with_schema(t.input_schema())
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_with_defaults_has_every_tool() {
        let registry = ToolRegistry::with_defaults();
        for name in [
            "read", "write", "edit", "delete", "glob", "grep", "bash", "memory",
            "session_search", "web_fetch", "cron", "browser_navigate", "browser_snapshot",
            "browser_click", "browser_type", "browser_press", "browser_scroll", "browser_back",
            "browser_screenshot", "browser_pdf", "browser_close",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {name}");
        }
        assert!(registry.get("nonexistent").is_none());
    }

    #[tokio::test]
    async fn take_schedules_drains_and_resets() {
        let ctx = ToolContext::new(std::env::temp_dir(), std::env::temp_dir());
        ctx.push_schedule(serde_json::json!({"action": "add"})).await;
        let drained = ctx.take_schedules().await;
        assert_eq!(drained.len(), 1);
        assert!(ctx.take_schedules().await.is_empty());
    }
}
