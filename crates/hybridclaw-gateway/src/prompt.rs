//! System prompt assembly: the turn's system prompt is the concatenation
//! of every enabled prompt hook's output, in registration order.

use std::path::Path;

/// Shared context every hook renders against.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Normalized bot/agent id.
    pub bot_id: String,
    /// The agent's workspace root (bind-mounted into the container).
    pub workspace_root: std::path::PathBuf,
}

/// One contributor to the assembled system prompt.
pub trait PromptHook: Send + Sync {
    /// Whether this hook contributes to the prompt at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Render this hook's section, or `None` to contribute nothing.
    fn render(&self, ctx: &PromptContext) -> Option<String>;
}

/// Opening identity line and the environment block (bot id, workspace
/// path, platform).
pub struct IdentityHook;

impl PromptHook for IdentityHook {
    fn render(&self, ctx: &PromptContext) -> Option<String> {
        Some(format!(
            "You are {}, a sandboxed AI agent with a private workspace.\n\n\
             # Environment\n\
             - Agent id: {}\n\
             - Workspace root: {}\n\
             - Platform: {}\n",
            ctx.bot_id,
            ctx.bot_id,
            ctx.workspace_root.display(),
            std::env::consts::OS,
        ))
    }
}

/// Tool usage guidance shown to every agent, independent of which tools
/// this turn actually has available.
pub struct ToolGuidelinesHook;

const TOOL_GUIDELINES: &str = "\
# Tool Usage Guidelines

## Files
- Read a file before editing it.
- Prefer `edit` over `write` for files that already exist.
- Use `read` with an offset/limit for large files instead of reading the whole thing.

## Memory
- Use the `memory` tool to persist durable facts to `MEMORY.md`, `USER.md`, or today's `memory/` note.
- Append, don't overwrite, unless the user explicitly asks you to replace something.

## Execution
- Use `bash` for git, build tools, and other terminal operations, never for file edits.

## Delegation
- Use `delegate` only for work that genuinely benefits from running as an isolated subagent turn.";

impl PromptHook for ToolGuidelinesHook {
    fn render(&self, _ctx: &PromptContext) -> Option<String> {
        Some(TOOL_GUIDELINES.to_owned())
    }
}

/// Project-specific instructions from an `AGENTS.md` file at the
/// workspace root, when present.
pub struct ProjectInstructionsHook;

impl PromptHook for ProjectInstructionsHook {
    fn render(&self, ctx: &PromptContext) -> Option<String> {
        let path = ctx.workspace_root.join("AGENTS.md");
        let contents = std::fs::read_to_string(path).ok()?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(format!("# Project Instructions\n\n{trimmed}"))
        }
    }
}

/// The built-in hook chain, in the order their sections appear in the
/// assembled prompt.
#[must_use]
pub fn builtin_hooks() -> Vec<Box<dyn PromptHook>> {
    vec![Box::new(IdentityHook), Box::new(ToolGuidelinesHook), Box::new(ProjectInstructionsHook)]
}

/// Concatenate every enabled hook's non-empty output, separated by a
/// blank line.
#[must_use]
pub fn assemble_system_prompt(hooks: &[Box<dyn PromptHook>], ctx: &PromptContext) -> String {
    hooks
        .iter()
        .filter(|h| h.enabled())
        .filter_map(|h| h.render(ctx))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The prompt prefixed to a subagent/isolated turn's own task prompt,
/// narrower than the full agent identity since the turn has no
/// conversational context of its own.
#[must_use]
pub fn isolated_turn_system_prompt(purpose: &str, workspace_root: &Path) -> String {
    format!(
        "You are an isolated agent turn running for {purpose}. \
         Your workspace root is {}. \
         Reply with plain text only; there is no further back-and-forth.",
        workspace_root.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_identity_and_guidelines_without_project_instructions() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PromptContext { bot_id: "assistant".to_owned(), workspace_root: dir.path().to_path_buf() };
        let prompt = assemble_system_prompt(&builtin_hooks(), &ctx);
        assert!(prompt.contains("You are assistant"));
        assert!(prompt.contains("Tool Usage Guidelines"));
        assert!(!prompt.contains("Project Instructions"));
    }

    #[test]
    fn includes_project_instructions_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AGENTS.md"), "Always write tests first.").unwrap();
        let ctx = PromptContext { bot_id: "assistant".to_owned(), workspace_root: dir.path().to_path_buf() };
        let prompt = assemble_system_prompt(&builtin_hooks(), &ctx);
        assert!(prompt.contains("Project Instructions"));
        assert!(prompt.contains("Always write tests first."));
    }
}
