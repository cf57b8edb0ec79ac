//! Directory scaffolding for the Hybridclaw host process.
//!
//! [`HybridclawHome`] is the single on-disk root the gateway, audit chain,
//! database store, and container pool all anchor to:
//!
//! ```text
//! ~/.hybridclaw/                    (HybridclawHome, or $HYBRIDCLAW_HOME)
//! ├── hybridclaw.db                 (C2 — sessions, messages, tasks, audit index)
//! ├── audit/<safeSessionId>/wire.jsonl   (C1 — per-session hash-chained log)
//! ├── agents/<agentId>/              (per-agent workspace, survives session clears)
//! │   ├── MEMORY.md
//! │   ├── USER.md
//! │   ├── memory/YYYY-MM-DD.md
//! │   ├── .session-transcripts/<safeSessionId>.jsonl
//! │   ├── .browser-artifacts/
//! │   └── .hybridclaw-runtime/
//! ├── mailboxes/<safeSessionId>/     (C3 — input.json / output.json)
//! └── logs/
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Global Hybridclaw home directory (`~/.hybridclaw/` or `$HYBRIDCLAW_HOME`).
#[derive(Debug, Clone)]
pub struct HybridclawHome {
    root: PathBuf,
}

impl HybridclawHome {
    /// Resolve the home directory.
    ///
    /// Checks `$HYBRIDCLAW_HOME` first, then falls back to `$HOME/.hybridclaw/`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$HYBRIDCLAW_HOME` is set but relative, or if
    /// neither `$HYBRIDCLAW_HOME` nor `$HOME` is set.
    pub fn resolve() -> io::Result<Self> {
        let root = if let Ok(custom) = std::env::var("HYBRIDCLAW_HOME") {
            let p = PathBuf::from(&custom);
            if !p.is_absolute() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "HYBRIDCLAW_HOME must be an absolute path",
                ));
            }
            p
        } else {
            let home = std::env::var("HOME").map_err(|_| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "neither HYBRIDCLAW_HOME nor HOME environment variable is set",
                )
            })?;
            PathBuf::from(home).join(".hybridclaw")
        };

        Ok(Self { root })
    }

    /// Create from an explicit path (useful for testing, and for the sandboxed
    /// container where `$HYBRIDCLAW_HOME` is bind-mounted at a fixed location).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the top-level directory structure exists with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.audit_dir())?;
        std::fs::create_dir_all(self.agents_dir())?;
        std::fs::create_dir_all(self.mailboxes_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(self.root(), perms)?;
        }
        Ok(())
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the embedded relational database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.root.join("hybridclaw.db")
    }

    /// Root of the per-session audit log tree (`audit/<safeSessionId>/wire.jsonl`).
    #[must_use]
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Root of the per-agent workspace tree, keyed by normalized `agentId`.
    #[must_use]
    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    /// Root of the per-session IPC mailbox tree.
    #[must_use]
    pub fn mailboxes_dir(&self) -> PathBuf {
        self.root.join("mailboxes")
    }

    /// Logs directory.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Replace characters outside `[A-Za-z0-9_-]` with `_`.
///
/// Used wherever an identifier (session id, agent id) is turned into a path
/// segment, so that host-supplied identifiers can never traverse or escape
/// the directory they are scoped to.
#[must_use]
pub fn safe_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_id_replaces_unsafe_chars() {
        assert_eq!(safe_id("cron:#12 at/3pm"), "cron__12_at_3pm");
        assert_eq!(safe_id("plain-id_123"), "plain-id_123");
    }

    #[test]
    fn home_path_accessors() {
        let home = HybridclawHome::from_path("/tmp/test-hybridclaw");
        assert_eq!(home.root(), Path::new("/tmp/test-hybridclaw"));
        assert_eq!(home.db_path(), PathBuf::from("/tmp/test-hybridclaw/hybridclaw.db"));
        assert_eq!(home.audit_dir(), PathBuf::from("/tmp/test-hybridclaw/audit"));
        assert_eq!(home.agents_dir(), PathBuf::from("/tmp/test-hybridclaw/agents"));
    }

    #[test]
    #[allow(unsafe_code)]
    fn home_resolve_rejects_relative_env() {
        // SAFETY: test runs single-threaded within this process for this var.
        unsafe { std::env::set_var("HYBRIDCLAW_HOME", "relative/path") };
        let result = HybridclawHome::resolve();
        unsafe { std::env::remove_var("HYBRIDCLAW_HOME") };
        assert!(result.is_err());
    }
}
