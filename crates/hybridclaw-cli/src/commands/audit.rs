//! Audit chain administration: recent/search/approvals/verify.

use anyhow::Result;
use colored::Colorize;
use hybridclaw_audit::{AuditLog, FileAuditLog};
use hybridclaw_core::SessionId;
use hybridclaw_storage::{ApprovalAuditEntry, Store, StructuredAuditRow};

use crate::theme::Theme;

/// Most recent structured-audit events across every session.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn recent(store: &Store, limit: i64) -> Result<()> {
    print_rows(&store.recent_audit(limit).await?);
    Ok(())
}

/// Most recent structured-audit events for one session.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn recent_for_session(store: &Store, session_id: &str, limit: i64) -> Result<()> {
    print_rows(&store.recent_audit_for_session(session_id, limit).await?);
    Ok(())
}

/// Substring search across event type and payload.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn search(store: &Store, query: &str, limit: i64) -> Result<()> {
    print_rows(&store.search_structured_audit(query, limit).await?);
    Ok(())
}

fn print_rows(rows: &[StructuredAuditRow]) {
    if rows.is_empty() {
        println!("{}", Theme::info("no matching audit events"));
        return;
    }

    println!("\n{}", Theme::header("Audit Events"));
    println!("{}", Theme::separator());
    for row in rows {
        println!(
            "{} {:<24} {} {}",
            Theme::timestamp(&row.timestamp),
            row.event_type,
            Theme::session_id(&row.session_id),
            row.payload,
        );
    }
    println!();
}

/// Most recent tool-call approval outcomes, optionally denials only.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn approvals(store: &Store, limit: i64, denied_only: bool) -> Result<()> {
    let rows = store.recent_approvals(limit, denied_only).await?;
    if rows.is_empty() {
        println!("{}", Theme::info("no approval records"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Approvals"));
    println!("{}", Theme::separator());
    for row in &rows {
        print_approval(row);
    }
    println!();
    Ok(())
}

fn print_approval(entry: &ApprovalAuditEntry) {
    let verdict = if entry.approved {
        "APPROVED".green().to_string()
    } else {
        "DENIED".red().to_string()
    };
    println!(
        "{} {verdict} {} {} via {}",
        Theme::timestamp(&entry.timestamp),
        entry.action,
        Theme::session_id(&entry.session_id),
        entry.method,
    );
}

/// Replay a session's hash-chained wire log and confirm every link.
///
/// Returns `false` if the chain failed verification, so the caller can map
/// that onto a non-zero exit code without treating it as an `Err`.
///
/// # Errors
///
/// Returns an error if the log cannot be read.
pub(crate) async fn verify(log: &FileAuditLog, session_id: &str) -> Result<bool> {
    let report = log.verify_session(&SessionId::from(session_id.to_owned())).await?;

    if report.ok {
        println!(
            "{}",
            Theme::success(&format!(
                "session {session_id} verified: {} record(s), last seq {}",
                report.checked_records, report.last_seq
            ))
        );
    } else {
        println!(
            "{}",
            Theme::error(&format!("session {session_id} failed verification: {} issue(s)", report.errors.len()))
        );
        for issue in &report.errors {
            println!("  - {issue}");
        }
    }

    Ok(report.ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridclaw_core::RunId;
    use hybridclaw_storage::NewSession;

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .create_session(NewSession {
                id: "s1".to_owned(),
                guild_id: None,
                channel_id: "c1".to_owned(),
                bot_id: "bot".to_owned(),
            })
            .await
            .unwrap();
        store
            .insert_structured_audit(StructuredAuditRow {
                session_id: "s1".to_owned(),
                seq: 1,
                event_type: "turn.start".to_owned(),
                timestamp: chrono::Utc::now(),
                run_id: "r1".to_owned(),
                parent_run_id: None,
                payload: serde_json::json!({"ok": true}),
                wire_prev_hash: "a".to_owned(),
                wire_hash: "b".to_owned(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn recent_search_and_session_scoped_queries_all_succeed() {
        let store = seeded_store().await;
        recent(&store, 10).await.unwrap();
        recent_for_session(&store, "s1", 10).await.unwrap();
        search(&store, "turn.start", 10).await.unwrap();
        approvals(&store, 10, false).await.unwrap();
    }

    #[tokio::test]
    async fn verify_reports_a_clean_chain_and_errors_on_a_missing_session() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::new(hybridclaw_core::HybridclawHome::from_path(dir.path()));
        let session = SessionId::from("s1");

        log.append_event(&session, &RunId::from("r1"), None, serde_json::json!({"type": "session.start"}))
            .await
            .unwrap();

        assert!(verify(&log, "s1").await.unwrap());
        assert!(verify(&log, "missing").await.is_err());
    }
}
