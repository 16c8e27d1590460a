//! Value typing for iCalendar content lines (RFC 5545 §3.3).
//!
//! Each content line is typed by its property name, overridable with the
//! `VALUE=` parameter. Anything untypeable stays `Value::Unknown` with the
//! raw text preserved.

use chrono::NaiveDate;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{ContentLine, IcalDateTime, IcalDuration, Property, RecurRule, Value};

/// Properties carrying DATE-TIME (or DATE) values.
const DATETIME_PROPS: [&str; 8] = [
    "DTSTART",
    "DTEND",
    "DUE",
    "DTSTAMP",
    "CREATED",
    "LAST-MODIFIED",
    "COMPLETED",
    "RECURRENCE-ID",
];

/// Properties carrying lists of DATE-TIME values.
const DATETIME_LIST_PROPS: [&str; 2] = ["EXDATE", "RDATE"];

/// Properties carrying INTEGER values.
const INTEGER_PROPS: [&str; 4] = ["PRIORITY", "SEQUENCE", "PERCENT-COMPLETE", "REPEAT"];

/// Properties carrying comma-separated TEXT lists.
const TEXT_LIST_PROPS: [&str; 2] = ["CATEGORIES", "RESOURCES"];

/// Properties carrying URI or CAL-ADDRESS values.
const URI_PROPS: [&str; 3] = ["URL", "ORGANIZER", "ATTENDEE"];

/// ## Summary
/// Types a content line into a `Property`.
///
/// ## Errors
/// Returns an error when a property that must carry a structured value
/// (date-time, duration, recurrence rule) fails to parse as one.
pub fn type_content_line(cl: ContentLine, line_num: usize) -> ParseResult<Property> {
    let declared = cl.value_type().map(str::to_ascii_uppercase);
    let tzid = cl.tzid().map(String::from);
    let name = cl.name.clone();
    let raw = cl.raw_value.clone();

    let value = match declared.as_deref() {
        Some("TEXT") => Value::Text(unescape_text(&raw)),
        Some("INTEGER") => parse_integer(&raw, line_num)?,
        Some("FLOAT") => parse_float(&raw, line_num)?,
        Some("BOOLEAN") => parse_boolean(&raw, line_num)?,
        Some("DATE") => parse_date(&raw, line_num)?,
        Some("DATE-TIME") => typed_datetime(&name, &raw, tzid.as_deref(), line_num)?,
        Some("DURATION") => parse_duration_value(&raw, line_num)?,
        Some("BINARY") => Value::Binary(raw.clone()),
        Some("URI" | "CAL-ADDRESS") => Value::Uri(raw.clone()),
        Some(_) => Value::Unknown(raw.clone()),
        None => type_by_property_name(&name, &raw, tzid.as_deref(), line_num)?,
    };

    Ok(Property {
        name: cl.name,
        params: cl.params,
        value,
        raw_value: cl.raw_value,
    })
}

fn type_by_property_name(
    name: &str,
    raw: &str,
    tzid: Option<&str>,
    line_num: usize,
) -> ParseResult<Value> {
    if DATETIME_PROPS.contains(&name) {
        return typed_datetime(name, raw, tzid, line_num);
    }
    if DATETIME_LIST_PROPS.contains(&name) {
        return parse_datetime_list(raw, tzid, line_num);
    }
    if INTEGER_PROPS.contains(&name) {
        return parse_integer(raw, line_num);
    }
    if TEXT_LIST_PROPS.contains(&name) {
        return Ok(Value::TextList(
            split_unescaped(raw).into_iter().map(|s| unescape_text(&s)).collect(),
        ));
    }
    if URI_PROPS.contains(&name) {
        return Ok(Value::Uri(raw.to_string()));
    }
    match name {
        "DURATION" => parse_duration_value(raw, line_num),
        "RRULE" => parse_recur(raw, line_num),
        _ => Ok(Value::Text(unescape_text(raw))),
    }
}

/// DATE-TIME properties may legally carry a bare DATE (all-day events).
fn typed_datetime(
    _name: &str,
    raw: &str,
    tzid: Option<&str>,
    line_num: usize,
) -> ParseResult<Value> {
    if raw.contains('T') {
        IcalDateTime::parse(raw, tzid)
            .map(Value::DateTime)
            .ok_or_else(|| invalid_value(line_num, raw))
    } else {
        parse_date(raw, line_num)
    }
}

fn parse_date(raw: &str, line_num: usize) -> ParseResult<Value> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(Value::Date)
        .map_err(|_| invalid_value(line_num, raw))
}

fn parse_datetime_list(raw: &str, tzid: Option<&str>, line_num: usize) -> ParseResult<Value> {
    let mut list = Vec::new();
    for part in raw.split(',') {
        let dt = IcalDateTime::parse(part, tzid).ok_or_else(|| invalid_value(line_num, part))?;
        list.push(dt);
    }
    Ok(Value::DateTimeList(list))
}

fn parse_integer(raw: &str, line_num: usize) -> ParseResult<Value> {
    raw.parse::<i32>()
        .map(Value::Integer)
        .map_err(|_| invalid_value(line_num, raw))
}

fn parse_float(raw: &str, line_num: usize) -> ParseResult<Value> {
    raw.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| invalid_value(line_num, raw))
}

fn parse_boolean(raw: &str, line_num: usize) -> ParseResult<Value> {
    match raw.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(Value::Boolean(true)),
        "FALSE" => Ok(Value::Boolean(false)),
        _ => Err(invalid_value(line_num, raw)),
    }
}

fn parse_duration_value(raw: &str, line_num: usize) -> ParseResult<Value> {
    IcalDuration::parse(raw)
        .map(Value::Duration)
        .ok_or_else(|| invalid_value(line_num, raw))
}

fn parse_recur(raw: &str, line_num: usize) -> ParseResult<Value> {
    RecurRule::parse(raw)
        .map(Value::Recur)
        .ok_or_else(|| invalid_value(line_num, raw))
}

fn invalid_value(line_num: usize, raw: &str) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidValue, line_num, 1).with_context(raw.to_string())
}

/// ## Summary
/// Unescapes TEXT values per RFC 5545 §3.3.11 (`\\`, `\;`, `\,`, `\n`).
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }

    out
}

/// Splits a TEXT list on commas that are not escaped.
fn split_unescaped(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    parts.push(current);

    parts
}
