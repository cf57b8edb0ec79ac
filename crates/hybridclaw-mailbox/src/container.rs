//! Container-side half of the mailbox: read the stdin-delivered first turn,
//! then poll `input.json` for subsequent turns, writing replies to
//! `output.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{MailboxError, MailboxResult};
use crate::messages::{TurnRequest, TurnResponse};

/// Default container poll interval (spec §4.3).
pub const CONTAINER_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Container-side handle to its own mailbox directory.
pub struct ContainerMailbox {
    dir: PathBuf,
}

impl ContainerMailbox {
    /// Build a handle over the bind-mounted mailbox directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn input_path(&self) -> PathBuf {
        self.dir.join("input.json")
    }

    fn output_path(&self) -> PathBuf {
        self.dir.join("output.json")
    }

    /// Read exactly one line from `stdin` and parse it as the first
    /// [`TurnRequest`]. The caller must not read further lines from this
    /// stream for mailbox purposes afterward.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream closes before a line arrives, or if
    /// the line fails to parse.
    pub async fn read_first_turn<R>(reader: R) -> MailboxResult<TurnRequest>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let line = lines.next_line().await?.ok_or_else(|| {
            MailboxError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed before the first turn request arrived",
            ))
        })?;
        serde_json::from_str(&line).map_err(|e| MailboxError::Parse {
            file: "stdin",
            source: e,
        })
    }

    /// Poll `input.json` until it appears, then consume (read + unlink) it.
    /// On parse failure, the malformed file is left in place and retried on
    /// the next tick, per spec.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only; parse failures retry silently.
    pub async fn poll_next_turn(&self) -> MailboxResult<TurnRequest> {
        loop {
            match self.try_consume_request(&self.input_path()).await? {
                Some(request) => return Ok(request),
                None => tokio::time::sleep(CONTAINER_POLL_INTERVAL).await,
            }
        }
    }

    async fn try_consume_request(&self, path: &Path) -> MailboxResult<Option<TurnRequest>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<TurnRequest>(&bytes) {
            Ok(request) => {
                tokio::fs::remove_file(path).await.ok();
                Ok(Some(request))
            }
            Err(_) => Ok(None),
        }
    }

    /// Write `response` as pretty JSON to `output.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn send_reply(&self, response: &TurnResponse) -> MailboxResult<()> {
        let json = serde_json::to_vec_pretty(response).map_err(|e| MailboxError::Parse {
            file: "output.json",
            source: e,
        })?;
        tokio::fs::write(self.output_path(), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{TurnStatus, WireMessage};
    use hybridclaw_core::{Role, SessionId};

    fn sample_request_json() -> String {
        let req = TurnRequest {
            session_id: SessionId::from("s1"),
            messages: vec![WireMessage {
                role: Role::User,
                content: "hi".to_owned(),
            }],
            bot_id: "default".to_owned(),
            enable_rag: false,
            base_url: "https://api.example/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key: "sk-secret".to_owned(),
            channel_id: "chan".to_owned(),
            scheduled_tasks: Vec::new(),
            allowed_tools: None,
        };
        serde_json::to_string(&req).unwrap()
    }

    #[tokio::test]
    async fn read_first_turn_parses_stdin_line() {
        let line = format!("{}\n", sample_request_json());
        let cursor = std::io::Cursor::new(line.into_bytes());
        let request = ContainerMailbox::read_first_turn(cursor).await.unwrap();
        assert_eq!(request.api_key, "sk-secret");
    }

    #[tokio::test]
    async fn poll_next_turn_consumes_and_unlinks_input() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = ContainerMailbox::new(dir.path());
        tokio::fs::write(mailbox.input_path(), sample_request_json())
            .await
            .unwrap();

        let request = mailbox.poll_next_turn().await.unwrap();
        assert_eq!(request.bot_id, "default");
        assert!(!mailbox.input_path().exists());
    }

    #[tokio::test]
    async fn malformed_input_is_retried_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = ContainerMailbox::new(dir.path());
        tokio::fs::write(mailbox.input_path(), b"not json")
            .await
            .unwrap();

        let result = mailbox.try_consume_request(&mailbox.input_path()).await.unwrap();
        assert!(result.is_none());
        assert!(mailbox.input_path().exists());
    }

    #[tokio::test]
    async fn send_reply_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = ContainerMailbox::new(dir.path());
        mailbox
            .send_reply(&TurnResponse::success("done"))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(mailbox.output_path()).await.unwrap();
        assert!(contents.contains('\n'));
        let parsed: TurnResponse = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.status, TurnStatus::Success);
    }
}
