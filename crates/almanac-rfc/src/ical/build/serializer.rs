//! iCalendar serializer (RFC 5545).
//!
//! Output is canonical: properties, parameters, and child components are
//! emitted in a fixed order, so logically equal calendars serialize to
//! identical bytes and ETags stay stable across round-trips.

use super::escape::{escape_param_value, escape_text};
use super::fold::fold_line;
use crate::ical::core::{Component, ComponentKind, ICalendar, Parameter, Property, Value};

/// Serializes an iCalendar document to a string.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    serialize_component(&ical.root)
}

/// Serializes a component to a string.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    let mut result = String::new();

    result.push_str(&fold_line(&format!("BEGIN:{}", component.name)));

    for prop in canonical_property_order(&component.properties, component.kind) {
        result.push_str(&serialize_property(prop));
    }

    for child in canonical_component_order(&component.children) {
        result.push_str(&serialize_component(child));
    }

    result.push_str(&fold_line(&format!("END:{}", component.name)));

    result
}

/// Serializes a property to a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();

    for param in canonical_param_order(&prop.params) {
        line.push(';');
        line.push_str(&serialize_parameter(param));
    }

    line.push(':');
    line.push_str(&serialize_value(&prop.value, &prop.raw_value));

    fold_line(&line)
}

fn serialize_parameter(param: &Parameter) -> String {
    let values: Vec<String> = param.values.iter().map(|v| escape_param_value(v)).collect();
    format!("{}={}", param.name, values.join(","))
}

/// Text values are re-escaped; structured values print from their parsed
/// form so stored and re-read calendars agree; everything else passes the
/// raw text through.
fn serialize_value(value: &Value, raw_value: &str) -> String {
    match value {
        Value::Text(s) => escape_text(s),
        Value::TextList(list) => list
            .iter()
            .map(|s| escape_text(s))
            .collect::<Vec<_>>()
            .join(","),
        Value::DateTime(dt) => dt.to_string(),
        Value::DateTimeList(list) => list
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Date(d) => d.format("%Y%m%d").to_string(),
        Value::Duration(d) => d.to_string(),
        Value::Recur(r) => r.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Uri(_) | Value::Binary(_) | Value::Unknown(_) => raw_value.to_string(),
    }
}

/// Returns properties in canonical order for deterministic output.
fn canonical_property_order(props: &[Property], kind: Option<ComponentKind>) -> Vec<&Property> {
    let order: &[&str] = match kind {
        Some(ComponentKind::Calendar) => &["VERSION", "PRODID", "CALSCALE", "METHOD"],
        Some(ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal) => &[
            "UID",
            "DTSTAMP",
            "DTSTART",
            "DTEND",
            "DUE",
            "DURATION",
            "RRULE",
            "RDATE",
            "EXDATE",
            "RECURRENCE-ID",
            "SUMMARY",
            "DESCRIPTION",
            "LOCATION",
            "CLASS",
            "STATUS",
            "PRIORITY",
            "TRANSP",
            "ORGANIZER",
            "ATTENDEE",
            "CATEGORIES",
            "URL",
            "COMPLETED",
            "PERCENT-COMPLETE",
            "CREATED",
            "LAST-MODIFIED",
            "SEQUENCE",
        ],
        Some(ComponentKind::Timezone) => &["TZID", "LAST-MODIFIED", "TZURL"],
        Some(ComponentKind::Standard | ComponentKind::Daylight) => &[
            "DTSTART",
            "TZOFFSETFROM",
            "TZOFFSETTO",
            "RRULE",
            "RDATE",
            "TZNAME",
        ],
        Some(ComponentKind::Alarm) => &["ACTION", "TRIGGER", "DESCRIPTION", "SUMMARY", "DURATION", "REPEAT"],
        _ => &[],
    };

    let mut ordered: Vec<&Property> = Vec::with_capacity(props.len());

    for &name in order {
        for prop in props {
            if prop.name.eq_ignore_ascii_case(name) {
                ordered.push(prop);
            }
        }
    }

    // Remaining properties (including X-properties) in original order
    for prop in props {
        if !order.iter().any(|&n| prop.name.eq_ignore_ascii_case(n)) {
            ordered.push(prop);
        }
    }

    ordered
}

/// Returns parameters in canonical order.
fn canonical_param_order(params: &[Parameter]) -> Vec<&Parameter> {
    let order = ["VALUE", "TZID", "ENCODING", "FMTTYPE", "LANGUAGE", "CN", "ROLE", "PARTSTAT", "RSVP", "RANGE"];

    let mut ordered: Vec<&Parameter> = Vec::with_capacity(params.len());

    for name in &order {
        for param in params {
            if param.name.eq_ignore_ascii_case(name) {
                ordered.push(param);
            }
        }
    }

    for param in params {
        if !order.iter().any(|n| param.name.eq_ignore_ascii_case(n)) {
            ordered.push(param);
        }
    }

    ordered
}

/// Returns child components in canonical order: timezones first, then
/// events, todos, journals; series siblings sort by UID then RECURRENCE-ID
/// so masters precede their overrides.
fn canonical_component_order(children: &[Component]) -> Vec<&Component> {
    let mut timezones: Vec<&Component> = Vec::new();
    let mut events: Vec<&Component> = Vec::new();
    let mut todos: Vec<&Component> = Vec::new();
    let mut journals: Vec<&Component> = Vec::new();
    let mut other: Vec<&Component> = Vec::new();

    for child in children {
        match child.kind {
            Some(ComponentKind::Timezone) => timezones.push(child),
            Some(ComponentKind::Event) => events.push(child),
            Some(ComponentKind::Todo) => todos.push(child),
            Some(ComponentKind::Journal) => journals.push(child),
            _ => other.push(child),
        }
    }

    events.sort_by(|a, b| cmp_by_uid_recurrence(a, b));
    todos.sort_by(|a, b| cmp_by_uid_recurrence(a, b));
    journals.sort_by(|a, b| cmp_by_uid_recurrence(a, b));

    let mut result = Vec::with_capacity(children.len());
    result.extend(timezones);
    result.extend(events);
    result.extend(todos);
    result.extend(journals);
    result.extend(other);
    result
}

fn cmp_by_uid_recurrence(a: &Component, b: &Component) -> std::cmp::Ordering {
    let uid_a = a.uid().unwrap_or("");
    let uid_b = b.uid().unwrap_or("");

    match uid_a.cmp(uid_b) {
        std::cmp::Ordering::Equal => {
            let recur_a = a
                .get_property("RECURRENCE-ID")
                .map_or("", |p| p.raw_value.as_str());
            let recur_b = b
                .get_property("RECURRENCE-ID")
                .map_or("", |p| p.raw_value.as_str());
            recur_a.cmp(recur_b)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse;

    #[test]
    fn serialize_simple_vevent() {
        let mut ical = ICalendar::new("-//Test//Test//EN");
        let mut event = Component::event();
        event.add_property(Property::text("UID", "test-uid-123"));
        event.add_property(Property::text("SUMMARY", "Test Event"));
        ical.root.add_child(event);

        let output = serialize(&ical);

        assert!(output.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(output.ends_with("END:VCALENDAR\r\n"));
        assert!(output.contains("VERSION:2.0\r\n"));
        assert!(output.contains("UID:test-uid-123\r\n"));
    }

    #[test]
    fn serialize_escapes_text() {
        let mut event = Component::event();
        event.add_property(Property::text("SUMMARY", "Meeting, important"));
        event.add_property(Property::text("DESCRIPTION", "Line 1\nLine 2"));

        let output = serialize_component(&event);

        assert!(output.contains("SUMMARY:Meeting\\, important\r\n"));
        assert!(output.contains("DESCRIPTION:Line 1\\nLine 2\r\n"));
    }

    #[test]
    fn serialize_folds_long_lines() {
        let mut event = Component::event();
        let long_summary = "A".repeat(100);
        event.add_property(Property::text("SUMMARY", &long_summary));

        let output = serialize_component(&event);

        assert!(output.contains("\r\n "));
        let unfolded = output.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("SUMMARY:{long_summary}\r\n")));
    }

    #[test]
    fn canonical_property_order_applies() {
        let mut event = Component::event();
        event.add_property(Property::text("SUMMARY", "Summary"));
        event.add_property(Property::text("UID", "uid"));

        let output = serialize_component(&event);

        let uid_pos = output.find("UID:").unwrap();
        let summary_pos = output.find("SUMMARY:").unwrap();
        assert!(uid_pos < summary_pos);
    }

    #[test]
    fn canonical_encode_is_a_fixed_point() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Out of order\r\n\
UID:fixed-point\r\n\
DTSTAMP:20240114T120000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let once = serialize(&parse::parse(input).unwrap());
        let twice = serialize(&parse::parse(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn master_sorts_before_override() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:s\r\n\
RECURRENCE-ID:20240116T090000Z\r\n\
SUMMARY:Override\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:s\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
SUMMARY:Master\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let output = serialize(&parse::parse(input).unwrap());
        let master_pos = output.find("SUMMARY:Master").unwrap();
        let override_pos = output.find("SUMMARY:Override").unwrap();
        assert!(master_pos < override_pos);
    }

    #[test]
    fn datetime_value_prints_from_parsed_form() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:dt\r\n\
DTSTART:20240115T090000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let output = serialize(&parse::parse(input).unwrap());
        assert!(output.contains("DTSTART:20240115T090000Z\r\n"));
    }
}
