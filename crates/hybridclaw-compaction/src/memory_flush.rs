//! Pre-compaction memory flush: an isolated, `memory`-only turn that gets
//! one last chance to persist durable facts before the messages that
//! carried them are deleted.

use tracing::warn;

use crate::transcript::format_transcript;
use crate::turn::{IsolatedTurnRequest, IsolatedTurnRunner};
use crate::types::{CompactionThresholds, Message};

const SYSTEM_PROMPT: &str = "You are reviewing a conversation excerpt that is about to be \
removed from active context. Identify any durable facts, preferences, or decisions worth \
keeping long-term and persist them using the memory tool, appending to MEMORY.md or a dated \
memory/<YYYY-MM-DD>.md file. Never overwrite existing memory content, only append. If nothing \
in the excerpt is worth keeping, reply with exactly MEMORY_FLUSH_SKIPPED and do nothing else.";

const SKIP_MARKER: &str = "MEMORY_FLUSH_SKIPPED";

/// Run the optional pre-compaction memory flush. Returns whether the
/// agent reported having written anything; any failure is logged and
/// treated as "nothing flushed" rather than aborting compaction.
pub async fn maybe_flush(
    session_id: &str,
    older_messages: &[Message],
    runner: &dyn IsolatedTurnRunner,
    thresholds: &CompactionThresholds,
) -> bool {
    if !thresholds.memory_flush_enabled {
        return false;
    }

    let transcript = format_transcript(
        older_messages,
        thresholds.memory_flush_max_messages,
        thresholds.memory_flush_max_chars,
    );
    if transcript.is_empty() {
        return false;
    }

    let request = IsolatedTurnRequest {
        session_id: session_id.to_owned(),
        system_prompt: SYSTEM_PROMPT.to_owned(),
        user_prompt: format!("Conversation excerpt:\n\n{transcript}"),
        allowed_tools: vec!["memory".to_owned()],
    };

    match runner.run(request).await {
        Ok(response) => {
            let flushed = response.trim() != SKIP_MARKER;
            if !flushed {
                tracing::debug!(session = %session_id, "memory flush: agent reported nothing to keep");
            }
            flushed
        }
        Err(error) => {
            warn!(session = %session_id, %error, "memory flush: isolated turn failed, continuing compaction");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticRunner(Result<String, String>);

    #[async_trait]
    impl IsolatedTurnRunner for StaticRunner {
        async fn run(&self, _request: IsolatedTurnRequest) -> Result<String, String> {
            self.0.clone()
        }
    }

    fn msg(id: i64) -> Message {
        Message {
            id,
            role: "user".to_owned(),
            content: "the user prefers dark mode".to_owned(),
        }
    }

    #[tokio::test]
    async fn disabled_flush_skips_the_turn() {
        let runner = StaticRunner(Ok("anything".to_owned()));
        let thresholds = CompactionThresholds {
            memory_flush_enabled: false,
            ..CompactionThresholds::default()
        };
        assert!(!maybe_flush("s1", &[msg(1)], &runner, &thresholds).await);
    }

    #[tokio::test]
    async fn skip_marker_reports_nothing_flushed() {
        let runner = StaticRunner(Ok(SKIP_MARKER.to_owned()));
        let flushed = maybe_flush("s1", &[msg(1)], &runner, &CompactionThresholds::default()).await;
        assert!(!flushed);
    }

    #[tokio::test]
    async fn successful_turn_reports_flushed() {
        let runner = StaticRunner(Ok("wrote to MEMORY.md".to_owned()));
        let flushed = maybe_flush("s1", &[msg(1)], &runner, &CompactionThresholds::default()).await;
        assert!(flushed);
    }

    #[tokio::test]
    async fn failed_turn_is_non_fatal() {
        let runner = StaticRunner(Err("model unavailable".to_owned()));
        let flushed = maybe_flush("s1", &[msg(1)], &runner, &CompactionThresholds::default()).await;
        assert!(!flushed);
    }

    #[tokio::test]
    async fn empty_transcript_skips_the_turn() {
        let runner = StaticRunner(Ok("wrote to MEMORY.md".to_owned()));
        let flushed = maybe_flush("s1", &[], &runner, &CompactionThresholds::default()).await;
        assert!(!flushed);
    }
}
