//! Parsing of a container's stderr stream into tool-progress events.

use std::sync::LazyLock;

use regex::Regex;

/// A tool-progress event surfaced from a container's stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolProgressEvent {
    /// A tool call began. `preview` is the truncated argument preview.
    Start {
        /// Tool name.
        name: String,
        /// Truncated preview of the tool's arguments.
        preview: String,
    },
    /// A tool call finished.
    Finish {
        /// Tool name.
        name: String,
        /// Truncated preview of the tool's result.
        preview: String,
        /// Wall-clock duration of the call, in milliseconds.
        duration_ms: u64,
    },
}

static START_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[tool\] ([^:]+): (.*)$").expect("valid regex"));

static FINISH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[tool\] ([^ ]+) result \((\d+)ms\): (.*)$").expect("valid regex")
});

/// Parse a single stderr line into a [`ToolProgressEvent`], if it matches
/// one of the two recognized shapes. Lines that don't match (ordinary log
/// chatter) return `None` and are otherwise ignored by the pool.
#[must_use]
pub fn parse_stderr_line(line: &str) -> Option<ToolProgressEvent> {
    if let Some(caps) = FINISH_PATTERN.captures(line) {
        let name = caps.get(1)?.as_str().to_owned();
        let duration_ms: u64 = caps.get(2)?.as_str().parse().ok()?;
        let preview = caps.get(3)?.as_str().to_owned();
        return Some(ToolProgressEvent::Finish {
            name,
            preview,
            duration_ms,
        });
    }
    if let Some(caps) = START_PATTERN.captures(line) {
        let name = caps.get(1)?.as_str().to_owned();
        let preview = caps.get(2)?.as_str().to_owned();
        return Some(ToolProgressEvent::Start { name, preview });
    }
    None
}
