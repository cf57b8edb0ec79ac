//! Formats a batch of older messages into a plain-text transcript excerpt
//! for an isolated turn's prompt, capped by message count and char budget.

use crate::types::Message;

/// Format `messages` into a `"ROLE: content"`-per-line transcript, keeping
/// at most the `max_messages` closest to the cutoff (i.e. the tail) and
/// clipping the result to `max_chars` from the front so the most recent
/// context survives.
#[must_use]
pub fn format_transcript(messages: &[Message], max_messages: usize, max_chars: usize) -> String {
    let start = messages.len().saturating_sub(max_messages);
    let selected = &messages[start..];

    let full: String = selected
        .iter()
        .map(|m| format!("{}: {}", m.role.to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    clip_to_tail(&full, max_chars)
}

fn clip_to_tail(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_owned()
    } else {
        let skip = char_count - max_chars;
        text.chars().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i64, content: &str) -> Message {
        Message {
            id,
            role: "user".to_owned(),
            content: content.to_owned(),
        }
    }

    #[test]
    fn keeps_only_the_most_recent_messages() {
        let messages: Vec<Message> = (1..=10).map(|i| msg(i, "x")).collect();
        let transcript = format_transcript(&messages, 3, 10_000);
        assert_eq!(transcript.matches("USER: x").count(), 3);
    }

    #[test]
    fn clips_to_char_budget_keeping_the_tail() {
        let messages = vec![msg(1, "aaaaaaaaaa"), msg(2, "bbbbbbbbbb")];
        let transcript = format_transcript(&messages, 10, 10);
        assert_eq!(transcript.len(), 10);
        assert!(transcript.ends_with("bbbbbbbbbb") || transcript.chars().all(|c| c == 'b'));
    }

    #[test]
    fn empty_messages_produce_empty_transcript() {
        assert_eq!(format_transcript(&[], 10, 100), "");
    }
}
