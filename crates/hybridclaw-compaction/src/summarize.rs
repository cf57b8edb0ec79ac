//! The summarization step: merges the session's existing summary with the
//! older messages into one replacement summary via a tool-free isolated
//! turn.

use tracing::warn;

use crate::transcript::format_transcript;
use crate::turn::{IsolatedTurnRequest, IsolatedTurnRunner};
use crate::types::{CompactionThresholds, Message};

const SYSTEM_PROMPT: &str = "You maintain a running summary of a long-lived conversation. \
Given the existing summary (if any) and a batch of older messages, produce one replacement \
summary that merges both. Preserve goals, decisions, constraints, preferences, and open \
follow-ups. Be dense and factual; drop pleasantries and resolved tangents. Reply with the \
summary text only, no preamble or headings.";

/// Run the summarization turn, returning the new summary clipped to
/// `thresholds.summary_max_chars`, or `None` if the turn failed or
/// produced nothing usable.
pub async fn summarize(
    session_id: &str,
    older_messages: &[Message],
    existing_summary: Option<&str>,
    runner: &dyn IsolatedTurnRunner,
    thresholds: &CompactionThresholds,
) -> Option<String> {
    let transcript = format_transcript(
        older_messages,
        thresholds.summarization_max_messages,
        thresholds.summarization_max_chars,
    );

    let mut user_prompt = String::new();
    match existing_summary {
        Some(summary) if !summary.trim().is_empty() => {
            user_prompt.push_str("Existing summary:\n\n");
            user_prompt.push_str(summary.trim());
            user_prompt.push_str("\n\n");
        }
        _ => {}
    }
    user_prompt.push_str("Older messages to fold in:\n\n");
    user_prompt.push_str(&transcript);

    let request = IsolatedTurnRequest {
        session_id: session_id.to_owned(),
        system_prompt: SYSTEM_PROMPT.to_owned(),
        user_prompt,
        allowed_tools: Vec::new(),
    };

    let response = match runner.run(request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(session = %session_id, %error, "summarization: isolated turn failed");
            return None;
        }
    };

    let stripped = strip_code_fences(&response);
    if stripped.is_empty() {
        return None;
    }

    Some(clip_to_chars(&stripped, thresholds.summary_max_chars))
}

fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(after_open) = trimmed.strip_prefix("```") {
        let body = match after_open.find('\n') {
            Some(newline) => &after_open[newline + 1..],
            None => after_open,
        };
        let body = body.strip_suffix("```").unwrap_or(body);
        body.trim().to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn clip_to_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        text.chars().take(max_chars).collect()
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
            role: "assistant".to_owned(),
            content: "decided to use postgres".to_owned(),
        }
    }

    #[tokio::test]
    async fn strips_code_fences() {
        let runner = StaticRunner(Ok("```\nsummary text\n```".to_owned()));
        let summary = summarize("s1", &[msg(1)], None, &runner, &CompactionThresholds::default())
            .await
            .unwrap();
        assert_eq!(summary, "summary text");
    }

    #[tokio::test]
    async fn clips_to_max_chars() {
        let runner = StaticRunner(Ok("x".repeat(20)));
        let thresholds = CompactionThresholds {
            summary_max_chars: 5,
            ..CompactionThresholds::default()
        };
        let summary = summarize("s1", &[msg(1)], None, &runner, &thresholds).await.unwrap();
        assert_eq!(summary.len(), 5);
    }

    #[tokio::test]
    async fn failed_turn_returns_none() {
        let runner = StaticRunner(Err("boom".to_owned()));
        let summary = summarize("s1", &[msg(1)], None, &runner, &CompactionThresholds::default()).await;
        assert!(summary.is_none());
    }

    #[tokio::test]
    async fn empty_response_returns_none() {
        let runner = StaticRunner(Ok("   ".to_owned()));
        let summary = summarize("s1", &[msg(1)], None, &runner, &CompactionThresholds::default()).await;
        assert!(summary.is_none());
    }
}
