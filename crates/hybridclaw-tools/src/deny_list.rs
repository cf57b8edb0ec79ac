//! The `bash` tool's deny-list: segment-anchored patterns for commands that
//! are destructive or escape the sandbox, checked before spawning anything.
//!
//! The pattern-table-plus-first-match-wins shape follows the teacher's own
//! security-classification code; the individual patterns are regexes rather
//! than literal substrings because several of them (fork bomb, pipe-to-shell)
//! have a variable middle.

use std::sync::LazyLock;

use regex::Regex;

struct DenyPattern {
    regex: Regex,
    reason: &'static str,
}

static DENY_LIST: LazyLock<Vec<DenyPattern>> = LazyLock::new(|| {
    let patterns: &[(&str, &str)] = &[
        (r"\brm\s+(-\w*r\w*f?\w*|-\w*f\w*r\w*|--recursive)\b", "recursive rm"),
        (r"\bmkfs(\.\S+)?\b", "filesystem format"),
        (r"\bformat(\.exe|\.com)?\b", "disk format"),
        (r"\bdd\s+if=", "raw disk write via dd"),
        (r":\(\)\s*\{\s*:\|\s*:&\s*\}\s*;\s*:", "fork bomb"),
        (r"\|\s*(sh|bash|zsh)\b", "pipe to shell"),
        (r"[;&|]{1,2}\s*rm\s+-", "chained rm"),
        (r"\b(curl|wget)\b[^\n]*\|\s*(sh|bash)\b", "download piped to shell"),
        (r"\beval\b", "eval"),
        (r"\bsource\s+\S+\.sh\b", "sourcing a shell script"),
        (r"\b(pkill|killall|kill\s+-9)\b", "indiscriminate process kill"),
        (r"\b(shutdown|reboot|poweroff)\b", "system power control"),
        (r">\s*/dev/sd[a-z]\b", "raw block device write"),
    ];
    patterns
        .iter()
        .map(|(pattern, reason)| DenyPattern {
            regex: Regex::new(pattern).expect("deny-list pattern is valid regex"),
            reason,
        })
        .collect()
});

/// The literal result text for a blocked command.
pub const BLOCKED_MESSAGE: &str = "Command blocked by safety guard (dangerous pattern detected)";

/// Check `command` against the deny-list. Returns the matched pattern's
/// reason on the first hit, for logging; callers surface [`BLOCKED_MESSAGE`]
/// to the model.
pub fn check(command: &str) -> Option<&'static str> {
    DENY_LIST.iter().find(|p| p.regex.is_match(command)).map(|p| p.reason)
}
