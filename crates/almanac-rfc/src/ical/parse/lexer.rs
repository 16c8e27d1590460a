//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{ContentLine, Parameter};

/// Splits input into logical content lines, merging folded continuations.
///
/// Handles both CRLF and bare LF endings. Lines starting with SP/HTAB are
/// continuations of the previous line; per RFC 5545 §3.1 the CRLF and the
/// single whitespace character are removed, nothing is inserted.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if let Some(continuation) = line.strip_prefix([' ', '\t']) {
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
            } else {
                lines.push((i + 1, continuation.to_string()));
            }
        } else {
            lines.push((i + 1, line.to_string()));
        }
    }

    lines
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the line is malformed.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut chars = line.char_indices().peekable();
    let mut name_end = 0;
    let mut colon_pos = None;

    // Property name ends at ';' or ':'
    while let Some(&(i, c)) = chars.peek() {
        if c == ';' || c == ':' {
            name_end = i;
            if c == ':' {
                colon_pos = Some(i);
                chars.next();
            }
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidPropertyName,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }

    let name = line[..name_end].to_ascii_uppercase();

    // Parameters, if we stopped at ';'
    let mut params = Vec::new();
    if colon_pos.is_none() {
        chars.next(); // consume ';'
        loop {
            let (param, value_start) = parse_parameter(&mut chars, line, line_num)?;
            params.push(param);
            if let Some(start) = value_start {
                colon_pos = Some(start);
                break;
            }
        }
    }

    let value_start = colon_pos
        .map(|p| p + 1)
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()))?;

    Ok(ContentLine {
        name,
        params,
        raw_value: line[value_start..].to_string(),
    })
}

/// Parses one parameter.
///
/// Returns the parameter and, when the following separator was `:`, the
/// colon's byte offset (the value starts right after it).
fn parse_parameter(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<(Parameter, Option<usize>)> {
    let start = chars.peek().map_or(line.len(), |&(i, _)| i);

    // Parameter name, up to '='
    let mut name_end = start;
    while let Some(&(i, c)) = chars.peek() {
        if c == '=' {
            name_end = i;
            chars.next();
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidParameter,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == start {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let param_name = line[start..name_end].to_ascii_uppercase();

    // Comma-separated values, possibly quoted
    let mut values = Vec::new();
    loop {
        let value = parse_param_value(chars, line, line_num)?;
        values.push(value);

        match chars.next() {
            Some((_, ',')) => {}
            Some((_, ';')) => {
                return Ok((Parameter::with_values(param_name, values), None));
            }
            Some((i, ':')) => {
                return Ok((Parameter::with_values(param_name, values), Some(i)));
            }
            Some((i, c)) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, i + 1)
                        .with_context(format!("unexpected character '{c}'")),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Parses a parameter value (possibly quoted, with RFC 6868 caret escapes).
fn parse_param_value(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<String> {
    let Some(&(start, first)) = chars.peek() else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            line.len(),
        ));
    };

    if first == '"' {
        chars.next(); // opening quote
        let mut value = String::new();
        let mut closed = false;

        while let Some((_, c)) = chars.next() {
            if c == '"' {
                closed = true;
                break;
            }
            if c == '^' {
                match chars.peek() {
                    Some(&(_, '^')) => {
                        value.push('^');
                        chars.next();
                    }
                    Some(&(_, 'n')) => {
                        value.push('\n');
                        chars.next();
                    }
                    Some(&(_, '\'')) => {
                        value.push('"');
                        chars.next();
                    }
                    _ => value.push('^'),
                }
            } else {
                value.push(c);
            }
        }

        if !closed {
            return Err(ParseError::new(
                ParseErrorKind::UnclosedQuote,
                line_num,
                start + 1,
            ));
        }

        Ok(value)
    } else {
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c == ',' || c == ';' || c == ':' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        Ok(line[start..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_merges_folded_lines() {
        let input = "DESCRIPTION:This is a long description\r\n that continues here\r\nSUMMARY:x";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].1,
            "DESCRIPTION:This is a long descriptionthat continues here"
        );
    }

    #[test]
    fn split_handles_bare_lf() {
        let input = "DESCRIPTION:First\n Second";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, "DESCRIPTION:FirstSecond");
    }

    #[test]
    fn split_skips_blank_lines() {
        let input = "A:1\r\n\r\nB:2\r\n";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn parse_simple_line() {
        let cl = parse_content_line("SUMMARY:Team Meeting", 1).unwrap();
        assert_eq!(cl.name, "SUMMARY");
        assert!(cl.params.is_empty());
        assert_eq!(cl.raw_value, "Team Meeting");
    }

    #[test]
    fn parse_line_with_param() {
        let cl = parse_content_line("DTSTART;TZID=America/New_York:20260123T120000", 1).unwrap();
        assert_eq!(cl.name, "DTSTART");
        assert_eq!(cl.params.len(), 1);
        assert_eq!(cl.tzid(), Some("America/New_York"));
        assert_eq!(cl.raw_value, "20260123T120000");
    }

    #[test]
    fn parse_line_with_quoted_param() {
        let cl = parse_content_line("ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com", 1).unwrap();
        assert_eq!(cl.params[0].value(), Some("Doe, Jane"));
        assert_eq!(cl.raw_value, "mailto:jane@example.com");
    }

    #[test]
    fn parse_line_with_multiple_param_values() {
        let cl = parse_content_line(
            "ATTENDEE;ROLE=REQ-PARTICIPANT,OPT-PARTICIPANT:mailto:test@example.com",
            1,
        )
        .unwrap();
        assert_eq!(cl.params[0].values.len(), 2);
    }

    #[test]
    fn parse_line_with_caret_escape() {
        let cl = parse_content_line("ATTENDEE;CN=\"Test^nName\":mailto:test@example.com", 1).unwrap();
        assert_eq!(cl.params[0].value(), Some("Test\nName"));
    }

    #[test]
    fn parse_line_unclosed_quote() {
        let err = parse_content_line("ATTENDEE;CN=\"Unclosed:mailto:t@example.com", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
    }

    #[test]
    fn parse_line_missing_colon() {
        assert!(parse_content_line("INVALID", 1).is_err());
    }

    #[test]
    fn parse_line_empty_value() {
        let cl = parse_content_line("X-EMPTY:", 1).unwrap();
        assert_eq!(cl.raw_value, "");
    }
}
