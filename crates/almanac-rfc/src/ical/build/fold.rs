//! Content line folding for iCalendar (RFC 5545 §3.1).

/// Maximum line length in octets (not including CRLF).
const MAX_LINE_OCTETS: usize = 75;

/// Folds a content line to comply with the 75-octet limit.
///
/// Lines are folded by inserting CRLF followed by a single space.
/// Break points never split UTF-8 multi-byte sequences.
#[must_use]
pub fn fold_line(line: &str) -> String {
    let bytes = line.as_bytes();

    if bytes.len() <= MAX_LINE_OCTETS {
        return format!("{line}\r\n");
    }

    let mut result = String::with_capacity(bytes.len() + (bytes.len() / MAX_LINE_OCTETS) * 3);
    let mut pos = 0;
    let mut first_line = true;

    while pos < bytes.len() {
        // Continuation lines lose one octet to the leading space
        let max_len = if first_line {
            MAX_LINE_OCTETS
        } else {
            MAX_LINE_OCTETS - 1
        };

        let remaining = bytes.len() - pos;
        if remaining <= max_len {
            if !first_line {
                result.push(' ');
            }
            result.push_str(&line[pos..]);
            result.push_str("\r\n");
            break;
        }

        let mut end = pos + max_len;
        while end > pos && !line.is_char_boundary(end) {
            end -= 1;
        }
        if end == pos {
            end = pos + 1;
            while end < bytes.len() && !line.is_char_boundary(end) {
                end += 1;
            }
        }

        if !first_line {
            result.push(' ');
        }
        result.push_str(&line[pos..end]);
        result.push_str("\r\n");

        pos = end;
        first_line = false;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_short_line() {
        assert_eq!(fold_line("SUMMARY:Short"), "SUMMARY:Short\r\n");
    }

    #[test]
    fn fold_exactly_75() {
        let line = "X".repeat(75);
        assert_eq!(fold_line(&line), format!("{line}\r\n"));
    }

    #[test]
    fn fold_long_line_roundtrips() {
        let line = "X".repeat(150);
        let result = fold_line(&line);

        assert!(result.contains("\r\n "));

        let unfolded = result.replace("\r\n ", "").replace("\r\n", "");
        assert_eq!(unfolded, line);
    }

    #[test]
    fn fold_first_segment_is_75_octets() {
        let line = "A".repeat(80);
        let result = fold_line(&line);

        let segments: Vec<&str> = result.split("\r\n").filter(|s| !s.is_empty()).collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 75);
        assert_eq!(segments[1].len(), 6); // space + 5 chars
    }

    #[test]
    fn fold_preserves_utf8() {
        let prefix = "A".repeat(73);
        let line = format!("{prefix}день");

        let result = fold_line(&line);
        let unfolded = result.replace("\r\n ", "").replace("\r\n", "");
        assert_eq!(unfolded, line);

        for segment in result.split("\r\n") {
            let trimmed = segment.strip_prefix(' ').unwrap_or(segment);
            assert!(std::str::from_utf8(trimmed.as_bytes()).is_ok());
        }
    }
}
