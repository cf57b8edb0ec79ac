//! Orchestrates one best-effort compaction attempt: threshold check,
//! optional memory flush, summarization, and commit.

use tracing::{info, warn};

use crate::memory_flush::maybe_flush;
use crate::store::SessionStore;
use crate::summarize::summarize;
use crate::turn::IsolatedTurnRunner;
use crate::types::{CompactionOutcome, CompactionThresholds};

/// Run one compaction attempt for `session_id`. Never propagates an
/// error: every step is best-effort, and any failure short of a
/// non-empty summary leaves the session exactly as it was.
pub async fn compact_session_if_needed(
    session_id: &str,
    store: &dyn SessionStore,
    runner: &dyn IsolatedTurnRunner,
    thresholds: &CompactionThresholds,
) -> CompactionOutcome {
    let count = match store.message_count(session_id).await {
        Ok(count) => count,
        Err(error) => {
            warn!(session = %session_id, %error, "compaction: failed to read message count");
            return CompactionOutcome::SkippedBelowThreshold;
        }
    };

    if count < thresholds.message_count_threshold {
        return CompactionOutcome::SkippedBelowThreshold;
    }

    let (cutoff_id, older_messages) = match store
        .fetch_older_messages(session_id, thresholds.effective_keep_recent())
        .await
    {
        Ok(result) => result,
        Err(error) => {
            warn!(session = %session_id, %error, "compaction: failed to fetch older messages");
            return CompactionOutcome::SkippedNoSummary;
        }
    };

    if older_messages.is_empty() {
        return CompactionOutcome::SkippedNoSummary;
    }

    let flushed = maybe_flush(session_id, &older_messages, runner, thresholds).await;
    if flushed {
        info!(session = %session_id, "compaction: memory flush persisted durable facts");
    }

    let existing_summary = match store.existing_summary(session_id).await {
        Ok(summary) => summary,
        Err(error) => {
            warn!(session = %session_id, %error, "compaction: failed to read existing summary");
            None
        }
    };

    let Some(summary) = summarize(
        session_id,
        &older_messages,
        existing_summary.as_deref(),
        runner,
        thresholds,
    )
    .await
    else {
        return CompactionOutcome::SkippedNoSummary;
    };

    if let Err(error) = store.commit_summary(session_id, cutoff_id, &summary).await {
        warn!(session = %session_id, %error, "compaction: failed to commit summary");
        return CompactionOutcome::SkippedNoSummary;
    }

    info!(
        session = %session_id,
        cutoff_id,
        messages_removed = older_messages.len(),
        summary_chars = summary.len(),
        "compaction: committed"
    );

    CompactionOutcome::Committed {
        cutoff_id,
        summary_chars: summary.len(),
    }
}
