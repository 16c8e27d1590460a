//! iCalendar document parser (RFC 5545).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use super::values::type_content_line;
use crate::ical::core::{Component, ComponentKind, ContentLine, ICalendar};

/// ## Summary
/// Parses an iCalendar document from a string.
///
/// ## Errors
/// Returns an error if the input is not a well-formed VCALENDAR.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    let lines = split_lines(input);

    if lines.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    }

    let content_lines: Vec<(usize, ContentLine)> = lines
        .into_iter()
        .map(|(line_num, line)| parse_content_line(&line, line_num).map(|cl| (line_num, cl)))
        .collect::<ParseResult<_>>()?;

    tracing::trace!(count = content_lines.len(), "Parsed content lines");

    let mut iter = content_lines.into_iter();

    let (line_num, begin) = iter
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;
    if begin.name != "BEGIN" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1));
    }
    let root_name = begin.raw_value.to_ascii_uppercase();
    if root_name != "VCALENDAR" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
            .with_context("expected VCALENDAR"));
    }

    let root = parse_component_body(&mut iter, line_num, &root_name)?;

    if iter.next().is_some() {
        return Err(ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
            .with_context("content after END:VCALENDAR"));
    }

    Ok(ICalendar { root })
}

/// Parses the body of a component whose BEGIN line was already consumed,
/// recursing into nested components.
fn parse_component_body(
    iter: &mut impl Iterator<Item = (usize, ContentLine)>,
    begin_line_num: usize,
    component_name: &str,
) -> ParseResult<Component> {
    let mut component = Component {
        kind: Some(ComponentKind::parse(component_name)),
        name: component_name.to_string(),
        properties: Vec::new(),
        children: Vec::new(),
    };

    let mut last_line_num = begin_line_num;

    loop {
        let Some((line_num, content_line)) = iter.next() else {
            return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line_num, 1)
                .with_context(format!("missing END:{component_name}")));
        };
        last_line_num = line_num;

        match content_line.name.as_str() {
            "BEGIN" => {
                let nested_name = content_line.raw_value.to_ascii_uppercase();
                let nested = parse_component_body(iter, line_num, &nested_name)?;
                component.children.push(nested);
            }
            "END" => {
                let end_name = content_line.raw_value.to_ascii_uppercase();
                if end_name != component_name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{component_name}, got END:{end_name}"
                            )),
                    );
                }
                return Ok(component);
            }
            _ => {
                let property = type_content_line(content_line, line_num)?;
                component.properties.push(property);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::core::Value;

    const SIMPLE: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
DTSTAMP:20240114T120000Z\r\n\
DTSTART:20240115T090000Z\r\n\
DTEND:20240115T100000Z\r\n\
SUMMARY:Meeting\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parse_simple_event() {
        let ical = parse(SIMPLE).unwrap();
        assert_eq!(ical.version(), Some("2.0"));
        assert_eq!(ical.prodid(), Some("-//Test//Test//EN"));
        assert_eq!(ical.events().len(), 1);

        let event = ical.events()[0];
        assert_eq!(event.uid(), Some("4fbe8971-0bc3-424c-9c26-36c3e1eff6b1"));
        assert!(matches!(
            event.get_property("DTSTART").unwrap().value,
            Value::DateTime(_)
        ));
    }

    #[test]
    fn parse_nested_alarm() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:a\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let event = ical.events()[0];
        assert_eq!(event.children.len(), 1);
        assert_eq!(event.children[0].kind, Some(ComponentKind::Alarm));
    }

    #[test]
    fn parse_rejects_missing_end() {
        let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEnd);
    }

    #[test]
    fn parse_rejects_mismatched_end() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedComponent);
    }

    #[test]
    fn parse_rejects_non_calendar_root() {
        let input = "BEGIN:VEVENT\r\nEND:VEVENT\r\n";
        assert!(parse(input).is_err());
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(parse("").is_err());
    }

    #[test]
    fn parse_two_components_sharing_uid() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:shared\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:shared\r\n\
RECURRENCE-ID:20240116T090000Z\r\n\
SUMMARY:Moved\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        assert_eq!(ical.events().len(), 2);
        assert_eq!(ical.uid(), Some("shared"));
        assert!(ical.events()[1].is_override());
    }
}
