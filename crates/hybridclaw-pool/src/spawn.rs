//! Construction of container spawn arguments: bind mounts, environment, and
//! the allow-list check guarding extra host paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hybridclaw_core::SessionId;

use crate::error::{PoolError, PoolResult};

/// Default container image, overridable via configuration.
pub const DEFAULT_IMAGE: &str = "hybridclaw/sandbox:latest";

/// Host users at or above this uid run the container as root's default
/// mapped identity rather than being re-mapped.
const DEFAULT_CONTAINER_UID: u32 = 1000;

/// Path fragments that must never appear inside an accepted extra bind
/// mount, matched case-insensitively against the resolved host path.
const BLOCKED_PATH_PATTERNS: &[&str] = &[
    ".ssh", ".gnupg", ".aws", ".env", "id_rsa", "id_ed25519", "id_ecdsa", "credentials",
];

/// One bind mount to add to the container beyond the standard workspace
/// and mailbox mounts.
#[derive(Debug, Clone)]
pub struct BindMount {
    /// Path on the host.
    pub host_path: PathBuf,
    /// Path inside the container.
    pub container_path: PathBuf,
    /// Whether the mount is read-write (vs. read-only).
    pub read_write: bool,
}

/// Everything needed to spawn one sandboxed turn-runner container for a
/// session.
#[derive(Debug, Clone)]
pub struct SpawnArgs {
    /// Container image to run.
    pub image: String,
    /// Per-session workspace directory, bind-mounted read-write.
    pub workspace_dir: PathBuf,
    /// Per-session mailbox directory, bind-mounted read-write.
    pub mailbox_dir: PathBuf,
    /// Additional allow-listed bind mounts.
    pub extra_mounts: Vec<BindMount>,
    /// `uid:gid` to run the container process as, when the host user is
    /// non-root and not the default `1000`.
    pub run_as: Option<(u32, u32)>,
    /// Model provider base URL, passed through as an env var.
    pub base_url: String,
    /// Model name, passed through as an env var.
    pub model: String,
    /// Idle timeout passed through as an env var.
    pub idle_timeout: Duration,
}

impl SpawnArgs {
    /// Validate `mount` against the configured allow-list root and the
    /// blocked-pattern list, resolving symlinks first.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BindMountRejected`] if the resolved host path
    /// falls outside `allow_list_root`, or matches a blocked pattern. A
    /// read-write request against a read-only allow-list root is also
    /// rejected.
    pub fn validate_bind_mount(
        mount: &BindMount,
        allow_list_root: &Path,
        allow_list_permits_write: bool,
    ) -> PoolResult<()> {
        let resolved = mount
            .host_path
            .canonicalize()
            .map_err(|e| PoolError::BindMountRejected(format!("{}: {e}", mount.host_path.display())))?;

        if !resolved.starts_with(allow_list_root) {
            return Err(PoolError::BindMountRejected(format!(
                "{} resolves outside the allow-list root {}",
                resolved.display(),
                allow_list_root.display()
            )));
        }

        let lowercase = resolved.to_string_lossy().to_ascii_lowercase();
        if BLOCKED_PATH_PATTERNS.iter().any(|p| lowercase.contains(p)) {
            return Err(PoolError::BindMountRejected(format!(
                "{} matches a blocked pattern",
                resolved.display()
            )));
        }

        if mount.read_write && !allow_list_permits_write {
            return Err(PoolError::BindMountRejected(format!(
                "{} requested read-write but the allow-list root is read-only",
                resolved.display()
            )));
        }

        Ok(())
    }

    /// The `uid:gid` the container should run as, given the host's
    /// effective uid/gid. Returns `None` when the host user already is (or
    /// maps to) the default `1000`, in which case no override is needed.
    #[must_use]
    pub fn run_as_for_host_user(uid: u32, gid: u32) -> Option<(u32, u32)> {
        if uid == 0 || uid == DEFAULT_CONTAINER_UID {
            None
        } else {
            Some((uid, gid))
        }
    }

    /// Environment variables to pass into the container, beyond the
    /// mailbox path which the caller wires separately.
    #[must_use]
    pub fn env_vars(&self, session_id: &SessionId) -> Vec<(String, String)> {
        let mut env = vec![
            ("HYBRIDCLAW_SESSION_ID".to_owned(), session_id.to_string()),
            ("HYBRIDCLAW_BASE_URL".to_owned(), self.base_url.clone()),
            ("HYBRIDCLAW_MODEL".to_owned(), self.model.clone()),
            (
                "HYBRIDCLAW_IDLE_TIMEOUT_MS".to_owned(),
                self.idle_timeout.as_millis().to_string(),
            ),
        ];
        if self.run_as.is_some() {
            env.push(("HOME".to_owned(), "/home/node".to_owned()));
        }
        env
    }
}
