//! The container pool: one sandboxed turn-runner process per active
//! session, keyed by [`SessionId`].

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use hybridclaw_core::{HybridclawHome, SessionId};
use hybridclaw_mailbox::{HostMailbox, TurnRequest, TurnResponse};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::error::{PoolError, PoolResult};
use crate::progress::{parse_stderr_line, ToolProgressEvent};
use crate::spawn::SpawnArgs;

/// Default concurrency cap (spec §4.5).
pub const MAX_CONCURRENT: usize = 5;

/// Callback invoked for every parsed stderr progress event during a turn.
pub type ProgressCallback = Arc<dyn Fn(ToolProgressEvent) + Send + Sync>;

struct PoolEntry {
    child: Child,
    container_name: String,
    started_at: Instant,
    mailbox: HostMailbox,
}

/// Pool of live sandbox containers, one per session with turns in flight.
pub struct ContainerPool {
    entries: DashMap<SessionId, PoolEntry>,
    home: HybridclawHome,
    max_concurrent: usize,
    idle_timeout: Duration,
    /// Command used to launch a container (e.g. `docker`, `podman`, or a
    /// test double); kept configurable so the real spawn primitive stays
    /// out of this crate's hardcoded surface.
    runtime_command: String,
}

impl ContainerPool {
    /// Build an empty pool anchored at `home`.
    #[must_use]
    pub fn new(home: HybridclawHome, idle_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            home,
            max_concurrent: MAX_CONCURRENT,
            idle_timeout,
            runtime_command: "docker".to_owned(),
        }
    }

    /// Override the concurrency cap (tests, or configuration overrides).
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Override the container runtime command (tests use a stub binary).
    #[must_use]
    pub fn with_runtime_command(mut self, command: impl Into<String>) -> Self {
        self.runtime_command = command.into();
        self
    }

    /// Number of live pool entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Run one turn for `session_id`, reusing a live container if one
    /// exists, otherwise spawning a new one (subject to the concurrency
    /// cap).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TooManyActiveContainers`] when the cap is hit
    /// and no entry already exists for this session, or propagates
    /// spawn/mailbox errors.
    pub async fn run_turn(
        &self,
        session_id: &SessionId,
        request: TurnRequest,
        spawn_args: &SpawnArgs,
        progress: Option<ProgressCallback>,
    ) -> PoolResult<TurnResponse> {
        self.reap_dead_entry(session_id);

        if !self.entries.contains_key(session_id) {
            if self.entries.len() >= self.max_concurrent {
                return Err(PoolError::TooManyActiveContainers);
            }
            self.spawn_entry(session_id, spawn_args, progress).await?;
            self.send_first_turn(session_id, &request).await?;
        } else {
            self.send_subsequent_turn(session_id, &request).await?;
        }

        let mailbox = self
            .entries
            .get(session_id)
            .expect("entry was just spawned or confirmed present")
            .mailbox
            .clone();

        let response = mailbox.await_reply(self.idle_timeout).await?;

        if response.status == hybridclaw_mailbox::TurnStatus::Error {
            tracing::warn!(session = %session_id, error = ?response.error, "turn returned an error");
        }

        Ok(response)
    }

    async fn spawn_entry(
        &self,
        session_id: &SessionId,
        spawn_args: &SpawnArgs,
        progress: Option<ProgressCallback>,
    ) -> PoolResult<()> {
        let container_name = format!("hybridclaw-{session_id}");
        let mailbox = HostMailbox::open(&self.home, session_id).await?;

        let mut command = Command::new(&self.runtime_command);
        command
            .arg("run")
            .arg("--rm")
            .arg("--interactive")
            .arg("--read-only")
            .arg("--tmpfs")
            .arg("/tmp")
            .arg("--mount")
            .arg(format!(
                "type=bind,source={},target=/workspace,readonly=false",
                spawn_args.workspace_dir.display()
            ))
            .arg("--mount")
            .arg(format!(
                "type=bind,source={},target=/mailbox,readonly=false",
                spawn_args.mailbox_dir.display()
            ))
            .arg("--name")
            .arg(&container_name);

        for mount in &spawn_args.extra_mounts {
            command.arg("--mount").arg(format!(
                "type=bind,source={},target={},readonly={}",
                mount.host_path.display(),
                mount.container_path.display(),
                !mount.read_write
            ));
        }

        if let Some((uid, gid)) = spawn_args.run_as {
            command.arg("--user").arg(format!("{uid}:{gid}"));
        }

        for (key, value) in spawn_args.env_vars(session_id) {
            command.arg("--env").arg(format!("{key}={value}"));
        }

        command.arg(&spawn_args.image);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(read_stderr_progress(stderr, progress));
        }

        self.entries.insert(
            session_id.clone(),
            PoolEntry {
                child,
                container_name,
                started_at: Instant::now(),
                mailbox,
            },
        );
        Ok(())
    }

    async fn send_first_turn(&self, session_id: &SessionId, request: &TurnRequest) -> PoolResult<()> {
        let mut entry = self
            .entries
            .get_mut(session_id)
            .expect("entry was just spawned");
        let stdin = entry
            .child
            .stdin
            .as_mut()
            .expect("spawned with a piped stdin");
        entry.mailbox.send_first_turn(stdin, request).await?;
        Ok(())
    }

    async fn send_subsequent_turn(&self, session_id: &SessionId, request: &TurnRequest) -> PoolResult<()> {
        let entry = self
            .entries
            .get(session_id)
            .expect("presence checked by the caller");
        entry.mailbox.send_subsequent_turn(request).await?;
        Ok(())
    }

    /// Remove `session_id`'s entry if its child process has already exited.
    fn reap_dead_entry(&self, session_id: &SessionId) {
        let is_dead = self
            .entries
            .get_mut(session_id)
            .is_some_and(|mut entry| matches!(entry.child.try_wait(), Ok(Some(_))));
        if is_dead {
            self.entries.remove(session_id);
        }
    }

    /// Best-effort terminate every live container, waiting up to 10 s each.
    pub async fn stop_all(&self) {
        let session_ids: Vec<SessionId> =
            self.entries.iter().map(|e| e.key().clone()).collect();

        for session_id in session_ids {
            if let Some((_, mut entry)) = self.entries.remove(&session_id) {
                let name = entry.container_name.clone();
                let wait = tokio::time::timeout(Duration::from_secs(10), entry.child.wait()).await;
                if wait.is_err() {
                    tracing::warn!(container = %name, "timed out waiting for container to exit, killing");
                    entry.child.start_kill().ok();
                }
            }
        }
    }

    /// Age of the currently running entry for `session_id`, if any.
    #[must_use]
    pub fn entry_age(&self, session_id: &SessionId) -> Option<Duration> {
        self.entries.get(session_id).map(|e| e.started_at.elapsed())
    }
}

async fn read_stderr_progress(
    stderr: tokio::process::ChildStderr,
    progress: Option<ProgressCallback>,
) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(event) = parse_stderr_line(&line) {
                    if let Some(cb) = &progress {
                        cb(event);
                    }
                } else {
                    tracing::debug!(target: "hybridclaw_pool::container_stderr", "{line}");
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "error reading container stderr");
                break;
            }
        }
    }
}
