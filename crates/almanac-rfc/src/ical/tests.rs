//! Round-trip tests across the parser and serializer.

use super::build::serialize;
use super::core::Value;
use super::parse::parse;

const SIMPLE_MEETING: &str = "\
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
fn canonical_document_roundtrips_byte_equal() {
    let ical = parse(SIMPLE_MEETING).unwrap();
    assert_eq!(serialize(&ical), SIMPLE_MEETING);
}

#[test]
fn serialization_is_idempotent() {
    let shuffled = "\
BEGIN:VCALENDAR\r\n\
PRODID:-//Test//Test//EN\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Meeting\r\n\
DTEND:20240115T100000Z\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
DTSTART:20240115T090000Z\r\n\
DTSTAMP:20240114T120000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let canonical = serialize(&parse(shuffled).unwrap());
    assert_eq!(canonical, SIMPLE_MEETING);
    assert_eq!(serialize(&parse(&canonical).unwrap()), canonical);
}

#[test]
fn daily_rrule_roundtrips() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
DTSTART:20240115T090000Z\r\n\
RRULE:FREQ=DAILY;COUNT=10\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let ical = parse(input).unwrap();
    let rrule = ical.events()[0].get_property("RRULE").unwrap();
    match &rrule.value {
        Value::Recur(rule) => assert_eq!(rule.count, Some(10)),
        other => panic!("expected Recur, got {other:?}"),
    }
    assert_eq!(serialize(&ical), input);
}

#[test]
fn workweek_rrule_roundtrips() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
DTSTART:20240115T090000Z\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231T235959Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    assert_eq!(serialize(&parse(input).unwrap()), input);
}

#[test]
fn master_and_override_roundtrip() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
DTSTART:20240115T090000Z\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
SUMMARY:Standup\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
RECURRENCE-ID:20240116T090000Z\r\n\
SUMMARY:Standup (moved)\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let ical = parse(input).unwrap();
    assert_eq!(ical.events().len(), 2);
    assert_eq!(serialize(&ical), input);
}

#[test]
fn escaped_text_roundtrips() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
SUMMARY:Lunch\\, then planning\r\n\
DESCRIPTION:Line 1\\nLine 2\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let ical = parse(input).unwrap();
    let event = ical.events()[0];
    assert_eq!(
        event.get_property("SUMMARY").unwrap().as_text(),
        Some("Lunch, then planning")
    );
    assert_eq!(serialize(&ical), input);
}

#[test]
fn x_properties_pass_through() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1\r\n\
X-APPLE-TRAVEL-ADVISORY;VALUE=BOOLEAN:TRUE\r\n\
X-PLAIN:hello world\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let ical = parse(input).unwrap();
    let event = ical.events()[0];
    assert_eq!(
        event.get_property("X-APPLE-TRAVEL-ADVISORY").unwrap().value,
        Value::Boolean(true)
    );
    assert_eq!(serialize(&ical), input);
}
