//! Text escaping for iCalendar output (RFC 5545 §3.3.11, RFC 6868).

/// Escapes a TEXT value (`\` `;` `,` and newlines).
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a parameter value, quoting when it contains reserved characters
/// and caret-encoding quotes and newlines (RFC 6868).
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    let needs_quoting = s.contains([':', ';', ',']);
    let mut encoded = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '^' => encoded.push_str("^^"),
            '\n' => encoded.push_str("^n"),
            '"' => encoded.push_str("^'"),
            _ => encoded.push(c),
        }
    }

    if needs_quoting {
        format!("\"{encoded}\"")
    } else {
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_reserved() {
        assert_eq!(escape_text("a,b;c\\d"), "a\\,b\\;c\\\\d");
        assert_eq!(escape_text("line1\nline2"), "line1\\nline2");
    }

    #[test]
    fn escape_text_drops_carriage_returns() {
        assert_eq!(escape_text("a\r\nb"), "a\\nb");
    }

    #[test]
    fn escape_param_quotes_reserved() {
        assert_eq!(escape_param_value("Doe, Jane"), "\"Doe, Jane\"");
        assert_eq!(escape_param_value("a:b"), "\"a:b\"");
    }

    #[test]
    fn escape_param_caret_encodes() {
        assert_eq!(escape_param_value("a\"b"), "a^'b");
        assert_eq!(escape_param_value("a^b"), "a^^b");
        assert_eq!(escape_param_value("a\nb"), "a^nb");
    }

    #[test]
    fn escape_param_plain_passthrough() {
        assert_eq!(escape_param_value("Europe/Moscow"), "Europe/Moscow");
    }
}
