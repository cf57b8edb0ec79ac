//! `FileAuditLog`: the append-only, hash-chained `wire.jsonl` implementation
//! of [`AuditLog`].

use std::io::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use hybridclaw_core::{HybridclawHome, RunId, SessionId, safe_id};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::canonical::canonicalize;
use crate::entry::{MetadataGenesis, VerifyReport, WireRecord, WIRE_VERSION};
use crate::error::{AuditError, AuditResult};
use crate::redact::redact_value;

/// Append + verify contract for the per-session audit chain.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append a redacted, hash-chained event to `session_id`'s log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, written, or fsynced.
    async fn append_event(
        &self,
        session_id: &SessionId,
        run_id: &RunId,
        parent_run_id: Option<&RunId>,
        event: Value,
    ) -> AuditResult<WireRecord>;

    /// Replay `session_id`'s log and confirm every hash chain link.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read; chain breaks are
    /// reported in the returned [`VerifyReport`], not as an `Err`.
    async fn verify_session(&self, session_id: &SessionId) -> AuditResult<VerifyReport>;
}

#[derive(Debug, Clone)]
struct SessionChainState {
    path: PathBuf,
    last_seq: i64,
    last_hash: String,
}

/// `FileAuditLog`: one `wire.jsonl` per session under
/// `<home>/audit/<safeSessionId>/wire.jsonl`, chain state cached in memory
/// and rebuilt by replay on cold open.
pub struct FileAuditLog {
    home: HybridclawHome,
    state: DashMap<SessionId, SessionChainState>,
}

impl FileAuditLog {
    /// Build a log rooted at `home`.
    #[must_use]
    pub fn new(home: HybridclawHome) -> Self {
        Self {
            home,
            state: DashMap::new(),
        }
    }

    fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.home.audit_dir().join(safe_id(session_id.as_str()))
    }

    fn log_path(&self, session_id: &SessionId) -> PathBuf {
        self.session_dir(session_id).join("wire.jsonl")
    }

    async fn load_or_init_state(&self, session_id: &SessionId) -> AuditResult<SessionChainState> {
        if let Some(state) = self.state.get(session_id) {
            return Ok(state.clone());
        }

        let path = self.log_path(session_id);
        let state = if path.exists() {
            replay_state(&path).await?
        } else {
            tokio::fs::create_dir_all(self.session_dir(session_id)).await?;
            let genesis = MetadataGenesis::new(session_id.clone());
            let genesis_value = serde_json::to_value(&genesis)?;
            let genesis_hash = hash_canonical(&genesis_value);
            write_line(&path, &genesis_value).await?;
            SessionChainState {
                path: path.clone(),
                last_seq: 0,
                last_hash: genesis_hash,
            }
        };

        self.state.insert(session_id.clone(), state.clone());
        Ok(state)
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn append_event(
        &self,
        session_id: &SessionId,
        run_id: &RunId,
        parent_run_id: Option<&RunId>,
        event: Value,
    ) -> AuditResult<WireRecord> {
        let state = self.load_or_init_state(session_id).await?;
        let redacted = redact_value(&event);

        let mut record = WireRecord {
            version: WIRE_VERSION,
            seq: state.last_seq + 1,
            timestamp: chrono::Utc::now(),
            run_id: run_id.clone(),
            session_id: session_id.clone(),
            parent_run_id: parent_run_id.cloned(),
            event: redacted,
            prev_hash: state.last_hash.clone(),
            hash: String::new(),
        };

        let without_hash = serde_json::to_value(&record)?;
        record.hash = hash_canonical(&strip_hash_field(without_hash));

        let record_value = serde_json::to_value(&record)?;
        write_line(&state.path, &record_value).await?;

        self.state.insert(
            session_id.clone(),
            SessionChainState {
                path: state.path,
                last_seq: record.seq,
                last_hash: record.hash.clone(),
            },
        );

        Ok(record)
    }

    async fn verify_session(&self, session_id: &SessionId) -> AuditResult<VerifyReport> {
        let path = self.log_path(session_id);
        if !path.exists() {
            return Err(AuditError::SessionNotFound {
                session_id: session_id.as_str().to_owned(),
            });
        }

        let file = tokio::fs::File::open(&path).await?;
        let mut lines = BufReader::new(file).lines();

        let mut errors = Vec::new();
        let mut checked: u64 = 0;
        let mut last_seq = 0i64;

        let Some(first) = lines.next_line().await? else {
            return Ok(VerifyReport::ok(0, 0));
        };
        let genesis: Value = serde_json::from_str(&first)?;
        let mut expected_prev = hash_canonical(&genesis);

        while let Some(line) = lines.next_line().await? {
            checked += 1;
            let record: WireRecord = serde_json::from_str(&line)?;

            if record.prev_hash != expected_prev {
                errors.push(format!(
                    "seq {}: expected prevHash {}, found {}",
                    record.seq, expected_prev, record.prev_hash
                ));
            }

            let raw: Value = serde_json::from_str(&line)?;
            let recomputed = hash_canonical(&strip_hash_field(raw));
            if recomputed != record.hash {
                errors.push(format!(
                    "seq {}: stored hash does not match recomputed hash",
                    record.seq
                ));
            }

            last_seq = record.seq;
            expected_prev = record.hash;
        }

        Ok(VerifyReport {
            ok: errors.is_empty(),
            checked_records: checked,
            last_seq,
            errors,
        })
    }
}

fn strip_hash_field(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("_hash");
    }
    value
}

fn hash_canonical(value: &Value) -> String {
    use sha2::{Digest, Sha256};
    let canonical = canonicalize(value);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

async fn write_line(path: &Path, value: &Value) -> AuditResult<()> {
    let path = path.to_owned();
    let line = format!("{}\n", serde_json::to_string(value)?);
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            file.set_permissions(perms)?;
        }
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        Ok(())
    })
    .await
    .map_err(|e| AuditError::Storage(e.to_string()))??;
    Ok(())
}

async fn replay_state(path: &Path) -> AuditResult<SessionChainState> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let Some(first) = lines.next_line().await? else {
        return Ok(SessionChainState {
            path: path.to_owned(),
            last_seq: 0,
            last_hash: "0".repeat(64),
        });
    };

    let genesis: Value = serde_json::from_str(&first)?;
    let mut last_hash = hash_canonical(&genesis);
    let mut last_seq = 0i64;

    while let Some(line) = lines.next_line().await? {
        let record: WireRecord = serde_json::from_str(&line)?;
        last_seq = record.seq;
        last_hash = record.hash;
    }

    Ok(SessionChainState {
        path: path.to_owned(),
        last_seq,
        last_hash,
    })
}
