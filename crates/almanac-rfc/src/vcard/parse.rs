//! vCard parser (RFC 6350 §3).

use thiserror::Error;

use super::core::{VCard, VCardProperty};
use crate::ical::parse::{ParseError, ParseErrorKind, parse_content_line, split_lines};

/// vCard parse errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VcardParseError {
    #[error("missing BEGIN:VCARD")]
    MissingBegin,

    #[error("missing END:VCARD")]
    MissingEnd,

    #[error("missing VERSION property")]
    MissingVersion,

    #[error(transparent)]
    ContentLine(#[from] ParseError),
}

pub type VcardParseResult<T> = std::result::Result<T, VcardParseError>;

/// ## Summary
/// Parses a single vCard from a string.
///
/// ## Errors
/// Returns an error if the input is not a well-formed vCard.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> VcardParseResult<VCard> {
    let lines = split_lines(input);
    let mut iter = lines.into_iter();

    let (line_num, first) = iter.next().ok_or(VcardParseError::MissingBegin)?;
    let begin = split_group(&first, line_num)?;
    if begin.1.name != "BEGIN" || !begin.1.raw_value.eq_ignore_ascii_case("VCARD") {
        return Err(VcardParseError::MissingBegin);
    }

    let mut card = VCard::default();
    let mut closed = false;

    for (line_num, line) in iter {
        let (group, cl) = split_group(&line, line_num)?;

        match cl.name.as_str() {
            "END" => {
                if cl.raw_value.eq_ignore_ascii_case("VCARD") {
                    closed = true;
                    break;
                }
                return Err(VcardParseError::ContentLine(ParseError::new(
                    ParseErrorKind::MismatchedComponent,
                    line_num,
                    1,
                )));
            }
            "BEGIN" => {
                return Err(VcardParseError::ContentLine(ParseError::new(
                    ParseErrorKind::MismatchedComponent,
                    line_num,
                    1,
                )));
            }
            _ => card.add_property(VCardProperty {
                group,
                name: cl.name,
                params: cl.params,
                value: cl.raw_value,
            }),
        }
    }

    if !closed {
        return Err(VcardParseError::MissingEnd);
    }
    if card.version().is_none() {
        return Err(VcardParseError::MissingVersion);
    }

    Ok(card)
}

/// Splits the optional `group.` prefix off a content line before lexing.
fn split_group(
    line: &str,
    line_num: usize,
) -> VcardParseResult<(Option<String>, crate::ical::core::ContentLine)> {
    let name_end = line
        .find([';', ':'])
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()))?;

    if let Some(dot) = line[..name_end].find('.') {
        let group = line[..dot].to_string();
        let cl = parse_content_line(&line[dot + 1..], line_num)?;
        Ok((Some(group), cl))
    } else {
        Ok((None, parse_content_line(line, line_num)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "\
BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
UID:f0e362b6-d7d0-4a2f-b4b1-3d1d5b7a1c11\r\n\
FN:Jane Doe\r\n\
N:Doe;Jane;;;\r\n\
EMAIL;TYPE=work:jane@example.com\r\n\
END:VCARD\r\n";

    #[test]
    fn parse_simple_card() {
        let card = parse(SIMPLE).unwrap();
        assert_eq!(card.version(), Some("4.0"));
        assert_eq!(card.formatted_name(), Some("Jane Doe"));
        assert_eq!(
            card.get_property("EMAIL").unwrap().get_param_value("TYPE"),
            Some("work")
        );
    }

    #[test]
    fn parse_grouped_property() {
        let input = "\
BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
FN:X\r\n\
item1.TEL:+1234567\r\n\
END:VCARD\r\n";
        let card = parse(input).unwrap();
        let tel = card.get_property("TEL").unwrap();
        assert_eq!(tel.group.as_deref(), Some("item1"));
        assert_eq!(tel.value, "+1234567");
    }

    #[test]
    fn parse_rejects_missing_end() {
        let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:X\r\n";
        assert_eq!(parse(input).unwrap_err(), VcardParseError::MissingEnd);
    }

    #[test]
    fn parse_rejects_missing_version() {
        let input = "BEGIN:VCARD\r\nFN:X\r\nEND:VCARD\r\n";
        assert_eq!(parse(input).unwrap_err(), VcardParseError::MissingVersion);
    }

    #[test]
    fn parse_rejects_nested_card() {
        let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nBEGIN:VCARD\r\nEND:VCARD\r\nEND:VCARD\r\n";
        assert!(parse(input).is_err());
    }
}
