//! Append-only per-session transcript file, mirroring the
//! open-append-write-fsync-close idiom `hybridclaw_audit`'s wire log uses,
//! minus hash chaining (the audit chain already owns tamper evidence; this
//! file exists only so an agent's workspace carries a plain-text record of
//! its own conversations).

use std::io::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct TranscriptLine<'a> {
    timestamp: DateTime<Utc>,
    role: &'a str,
    content: &'a str,
}

/// Append one `{timestamp, role, content}` line to `path`, creating the
/// file (and its parent directory) if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub async fn append_line(path: &Path, role: &str, content: &str) -> std::io::Result<()> {
    let path = path.to_owned();
    let line = serde_json::to_string(&TranscriptLine { timestamp: Utc::now(), role, content: content.trim() })
        .expect("transcript line always serializes")
        + "\n";

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        Ok(())
    })
    .await
    .expect("blocking transcript write task never panics")
}
