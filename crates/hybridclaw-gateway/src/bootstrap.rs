//! Agent workspace bootstrap: the directory layout a freshly-seen agent id
//! needs before its first turn can run, per the layout documented on
//! [`hybridclaw_core::HybridclawHome`].

use std::path::{Path, PathBuf};

use hybridclaw_core::{HybridclawHome, safe_id};

const DEFAULT_MEMORY: &str = "# Memory\n\nDurable facts the agent has chosen to remember.\n";
const DEFAULT_USER: &str = "# User\n\nNotes about the person this agent works with.\n";

/// Everything under an agent's workspace root that must exist before a
/// turn (or tool call) can safely read or write into it.
#[derive(Debug, Clone)]
pub struct AgentWorkspace {
    root: PathBuf,
}

impl AgentWorkspace {
    /// Workspace root (bind-mounted into the container at `/workspace`).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to this session's append-only transcript file.
    #[must_use]
    pub fn transcript_path(&self, session_id: &str) -> PathBuf {
        self.root.join(".session-transcripts").join(format!("{}.jsonl", safe_id(session_id)))
    }
}

/// Create `agentId`'s workspace directory and bootstrap files if they
/// don't already exist. Idempotent: never overwrites an existing file.
///
/// # Errors
///
/// Returns an error if any directory or file creation fails.
pub async fn ensure_agent_workspace(home: &HybridclawHome, agent_id: &str) -> std::io::Result<AgentWorkspace> {
    let root = home.agents_dir().join(safe_id(agent_id));

    tokio::fs::create_dir_all(&root).await?;
    tokio::fs::create_dir_all(root.join("memory")).await?;
    tokio::fs::create_dir_all(root.join(".session-transcripts")).await?;
    tokio::fs::create_dir_all(root.join(".browser-artifacts")).await?;
    tokio::fs::create_dir_all(root.join(".hybridclaw-runtime")).await?;

    create_if_absent(&root.join("MEMORY.md"), DEFAULT_MEMORY).await?;
    create_if_absent(&root.join("USER.md"), DEFAULT_USER).await?;

    Ok(AgentWorkspace { root })
}

async fn create_if_absent(path: &Path, contents: &str) -> std::io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::write(path, contents).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstraps_every_documented_path() {
        let dir = tempfile::tempdir().unwrap();
        let home = HybridclawHome::from_path(dir.path());

        let workspace = ensure_agent_workspace(&home, "my bot").await.unwrap();

        assert!(workspace.root().join("MEMORY.md").exists());
        assert!(workspace.root().join("USER.md").exists());
        assert!(workspace.root().join("memory").is_dir());
        assert!(workspace.root().join(".session-transcripts").is_dir());
        assert!(workspace.root().join(".browser-artifacts").is_dir());
        assert!(workspace.root().join(".hybridclaw-runtime").is_dir());
    }

    #[tokio::test]
    async fn never_overwrites_existing_memory_file() {
        let dir = tempfile::tempdir().unwrap();
        let home = HybridclawHome::from_path(dir.path());
        let workspace = ensure_agent_workspace(&home, "bot").await.unwrap();

        tokio::fs::write(workspace.root().join("MEMORY.md"), "custom notes").await.unwrap();
        ensure_agent_workspace(&home, "bot").await.unwrap();

        let content = tokio::fs::read_to_string(workspace.root().join("MEMORY.md")).await.unwrap();
        assert_eq!(content, "custom notes");
    }
}
