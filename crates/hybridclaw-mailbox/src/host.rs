//! Host-side half of the mailbox: write requests, poll for replies.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hybridclaw_core::{HybridclawHome, SessionId, safe_id};
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;

use crate::error::{MailboxError, MailboxResult};
use crate::messages::{TurnRequest, TurnResponse};

/// Default host poll interval (spec §4.3).
pub const HOST_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default idle timeout before a poll loop gives up (spec §4.3).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default oversized-reply cap (spec §4.3).
pub const DEFAULT_MAX_REPLY_BYTES: u64 = 10 * 1024 * 1024;

/// Host-side handle to one session's mailbox directory.
#[derive(Clone)]
pub struct HostMailbox {
    dir: PathBuf,
    max_reply_bytes: u64,
}

impl HostMailbox {
    /// Build a handle rooted at `<home>/mailboxes/<safeSessionId>/`, creating
    /// the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(home: &HybridclawHome, session_id: &SessionId) -> MailboxResult<Self> {
        let dir = home.mailboxes_dir().join(safe_id(session_id.as_str()));
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
        })
    }

    /// Override the oversized-reply cap (tests, or configuration overrides).
    #[must_use]
    pub fn with_max_reply_bytes(mut self, limit: u64) -> Self {
        self.max_reply_bytes = limit;
        self
    }

    fn input_path(&self) -> PathBuf {
        self.dir.join("input.json")
    }

    fn output_path(&self) -> PathBuf {
        self.dir.join("output.json")
    }

    /// Deliver the very first request for a freshly spawned container over
    /// its stdin, as a single line ending with `\n`. The API key travels
    /// only this way and is never written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the stdin write fails.
    pub async fn send_first_turn(
        &self,
        stdin: &mut ChildStdin,
        request: &TurnRequest,
    ) -> MailboxResult<()> {
        let mut line = serde_json::to_string(request).map_err(|e| MailboxError::Parse {
            file: "stdin",
            source: e,
        })?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Deliver a subsequent request by writing `input.json`, with the API
    /// key blanked (the container retains its first-turn key in memory).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub async fn send_subsequent_turn(&self, request: &TurnRequest) -> MailboxResult<()> {
        let mut sanitized = request.clone();
        sanitized.api_key.clear();
        let json = serde_json::to_vec_pretty(&sanitized).map_err(|e| MailboxError::Parse {
            file: "input.json",
            source: e,
        })?;
        tokio::fs::write(self.input_path(), json).await?;
        Ok(())
    }

    /// Poll for `output.json`, consuming (reading then unlinking) it once
    /// present, up to `idle_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxError::Timeout`] if no reply appears before the
    /// deadline, [`MailboxError::ReplyTooLarge`] if the reply exceeds the
    /// configured cap, or a parse/IO error otherwise.
    pub async fn await_reply(&self, idle_timeout: Duration) -> MailboxResult<TurnResponse> {
        let deadline = Instant::now() + idle_timeout;
        let path = self.output_path();

        loop {
            if let Some(response) = self.try_consume_reply(&path).await? {
                return Ok(response);
            }
            if Instant::now() >= deadline {
                return Err(MailboxError::Timeout(idle_timeout));
            }
            tokio::time::sleep(HOST_POLL_INTERVAL).await;
        }
    }

    async fn try_consume_reply(&self, path: &Path) -> MailboxResult<Option<TurnResponse>> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if metadata.len() > self.max_reply_bytes {
            tokio::fs::remove_file(path).await.ok();
            return Err(MailboxError::ReplyTooLarge {
                limit: self.max_reply_bytes,
                actual: metadata.len(),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        tokio::fs::remove_file(path).await.ok();

        let response: TurnResponse =
            serde_json::from_slice(&bytes).map_err(|e| MailboxError::Parse {
                file: "output.json",
                source: e,
            })?;
        Ok(Some(response))
    }
}
