//! Byte/line-bounded truncation shared by the `read` and `bash` tool
//! executors (spec §4.4.3).

/// Truncate `content` to at most `max_lines` lines and `max_bytes` bytes,
/// whichever limit is hit first, on a line boundary. Returns the truncated
/// content and whether truncation occurred.
///
/// Truncation never splits a UTF-8 character or a line: the cut always
/// lands on a `\n` boundary (or end of input), so the trailer the caller
/// appends reports an honest "next offset".
#[must_use]
pub fn truncate_to_boundary(content: &str, max_lines: usize, max_bytes: usize) -> (String, bool) {
    if content.lines().count() <= max_lines && content.len() <= max_bytes {
        return (content.to_string(), false);
    }

    let mut out = String::new();
    let mut lines_taken = 0;
    for line in content.split_inclusive('\n') {
        if lines_taken >= max_lines {
            break;
        }
        if out.len() + line.len() > max_bytes {
            break;
        }
        out.push_str(line);
        lines_taken += 1;
    }

    // Guarantee forward progress: if the very first line already exceeds
    // max_bytes, truncation yields an empty result rather than looping.
    (out, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        let (out, truncated) = truncate_to_boundary("a\nb\nc\n", 10, 1024);
        assert_eq!(out, "a\nb\nc\n");
        assert!(!truncated);
    }

    #[test]
    fn truncates_on_line_count() {
        let input = "1\n2\n3\n4\n5\n";
        let (out, truncated) = truncate_to_boundary(input, 2, 1024);
        assert_eq!(out, "1\n2\n");
        assert!(truncated);
    }

    #[test]
    fn truncates_on_byte_count() {
        let input = "aaaa\nbbbb\ncccc\n";
        let (out, truncated) = truncate_to_boundary(input, 100, 10);
        assert_eq!(out, "aaaa\nbbbb\n");
        assert!(truncated);
    }

    #[test]
    fn never_splits_a_line() {
        let input = "short\nthis-line-is-too-long-to-fit\nshort\n";
        let (out, truncated) = truncate_to_boundary(input, 100, 10);
        assert_eq!(out, "short\n");
        assert!(truncated);
    }
}
