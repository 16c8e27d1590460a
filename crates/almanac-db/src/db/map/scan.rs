//! Parse-side codec: one VEVENT/VTODO component into row structs.

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use almanac_rfc::ical::core::{Component, ComponentKind, IcalDuration, Property, Value};
use almanac_rfc::ical::tz::TimeZoneResolver;

use super::recurrence::{EncodedRecurrence, encode_rule};
use crate::model::caldav::component::NewEventComponent;

/// An X-* property captured for the `custom_property` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCustomProp {
    pub name: String,
    /// Declared value type (`VALUE=` parameter), or `DEFAULT`.
    pub value_type: String,
    /// Serialized value text.
    pub value: String,
}

/// Everything the writer needs for one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedComponent {
    pub row: NewEventComponent,
    /// Encoded recurrence plus the canonical rule string, when the
    /// component carries an RRULE. The string backs rule-change detection
    /// on update.
    pub rule: Option<(EncodedRecurrence, String)>,
    /// EXDATE values, normalized to UTC.
    pub exdates: Vec<DateTime<Utc>>,
    /// RECURRENCE-ID, normalized to UTC, when this component overrides
    /// one occurrence.
    pub recurrence_id: Option<DateTime<Utc>>,
    pub custom_props: Vec<ScannedCustomProp>,
}

/// ## Summary
/// Scans a VEVENT/VTODO component into insert structs.
///
/// Every DATE-TIME value is normalized to UTC through `resolver`. The
/// all-day flag derives from DTEND − DTSTART being exactly 24 hours.
/// TRANSP maps OPAQUE to the set bit, TRANSPARENT to the unset bit.
///
/// ## Errors
/// Returns an error for unsupported component kinds or date-times whose
/// TZID resolves nowhere.
pub fn scan_component(
    component: &Component,
    file_uid: uuid::Uuid,
    resolver: &mut TimeZoneResolver,
) -> anyhow::Result<ScannedComponent> {
    let component_type = match component.kind {
        Some(ComponentKind::Event) => true,
        Some(ComponentKind::Todo) => false,
        _ => anyhow::bail!("component {} is not storable", component.name),
    };

    let start_date = time_value(component, "DTSTART", resolver)?;
    let end_date = time_value(component, "DTEND", resolver)?;

    let all_day = match (start_date, end_date) {
        (Some(start), Some(end)) => end - start == chrono::Duration::hours(24),
        _ => false,
    };

    let transparency = match component.get_property("TRANSP").and_then(Property::as_text) {
        Some("OPAQUE") => Some(true),
        Some("TRANSPARENT") => Some(false),
        _ => None,
    };

    let row = NewEventComponent {
        calendar_file_uid: file_uid,
        component_type,
        date_timestamp: time_value(component, "DTSTAMP", resolver)?,
        created_at: time_value(component, "CREATED", resolver)?,
        last_modified_at: time_value(component, "LAST-MODIFIED", resolver)?,
        summary: text_value(component, "SUMMARY"),
        description: text_value(component, "DESCRIPTION"),
        url: raw_value(component, "URL"),
        organizer: raw_value(component, "ORGANIZER"),
        start_date,
        end_date,
        duration_seconds: component
            .get_property("DURATION")
            .and_then(|p| p.value.as_duration())
            .map(IcalDuration::total_seconds),
        all_day,
        class: text_value(component, "CLASS"),
        location: text_value(component, "LOCATION"),
        priority: int_value(component, "PRIORITY"),
        sequence: int_value(component, "SEQUENCE"),
        status: text_value(component, "STATUS"),
        categories: raw_value(component, "CATEGORIES"),
        transparency,
        completed: time_value(component, "COMPLETED", resolver)?,
        percent_complete: int_value(component, "PERCENT-COMPLETE"),
    };

    let rule = component
        .get_property("RRULE")
        .and_then(|p| p.value.as_recur())
        .map(|r| (encode_rule(r, start_date), r.to_string()));

    let mut exdates = Vec::new();
    for prop in component.get_properties("EXDATE") {
        if let Value::DateTimeList(list) = &prop.value {
            for dt in list {
                exdates.push(resolver.to_utc(dt).context("EXDATE")?);
            }
        }
    }

    let recurrence_id = time_value(component, "RECURRENCE-ID", resolver)?;

    let custom_props = component
        .properties
        .iter()
        .filter(|p| p.name.starts_with("X-"))
        .map(|p| ScannedCustomProp {
            name: p.name.clone(),
            value_type: p
                .get_param_value("VALUE")
                .map_or_else(|| "DEFAULT".to_string(), str::to_ascii_uppercase),
            value: p.raw_value.clone(),
        })
        .collect();

    Ok(ScannedComponent {
        row,
        rule,
        exdates,
        recurrence_id,
        custom_props,
    })
}

fn text_value(component: &Component, name: &str) -> Option<String> {
    component
        .get_property(name)?
        .as_text()
        .map(str::to_string)
}

/// Raw passthrough for values whose wire form must survive unescaped
/// (URIs, comma-joined lists).
fn raw_value(component: &Component, name: &str) -> Option<String> {
    component.get_property(name).map(|p| p.raw_value.clone())
}

fn int_value(component: &Component, name: &str) -> Option<i32> {
    component.get_property(name)?.as_integer()
}

fn time_value(
    component: &Component,
    name: &str,
    resolver: &mut TimeZoneResolver,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    let Some(prop) = component.get_property(name) else {
        return Ok(None);
    };
    match &prop.value {
        Value::DateTime(dt) => Ok(Some(resolver.to_utc(dt).context(name.to_string())?)),
        Value::Date(d) => Ok(d
            .and_hms_opt(0, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_rfc::ical::parse::parse;
    use chrono::TimeZone;

    fn event_from(body: &str) -> Component {
        let input = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//T//T//EN\r\n{body}END:VCALENDAR\r\n"
        );
        let ical = parse(&input).unwrap();
        ical.root.children[0].clone()
    }

    fn scan(body: &str) -> ScannedComponent {
        let component = event_from(body);
        let mut resolver = TimeZoneResolver::new();
        scan_component(&component, uuid::Uuid::nil(), &mut resolver).unwrap()
    }

    #[test]
    fn scan_simple_event() {
        let scanned = scan(
            "BEGIN:VEVENT\r\n\
             UID:x\r\n\
             DTSTART:20240115T090000Z\r\n\
             DTEND:20240115T100000Z\r\n\
             SUMMARY:Meeting\r\n\
             END:VEVENT\r\n",
        );

        assert!(scanned.row.component_type);
        assert_eq!(scanned.row.summary.as_deref(), Some("Meeting"));
        assert_eq!(
            scanned.row.start_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
        );
        assert!(!scanned.row.all_day);
        assert!(scanned.rule.is_none());
        assert!(scanned.recurrence_id.is_none());
    }

    #[test]
    fn scan_todo_unsets_type_bit() {
        let scanned = scan("BEGIN:VTODO\r\nUID:x\r\nPERCENT-COMPLETE:40\r\nEND:VTODO\r\n");
        assert!(!scanned.row.component_type);
        assert_eq!(scanned.row.percent_complete, Some(40));
    }

    #[test]
    fn scan_derives_all_day() {
        let scanned = scan(
            "BEGIN:VEVENT\r\nUID:x\r\nDTSTART:20240115T000000Z\r\nDTEND:20240116T000000Z\r\nEND:VEVENT\r\n",
        );
        assert!(scanned.row.all_day);
    }

    #[test]
    fn scan_maps_transparency_bits() {
        let opaque = scan("BEGIN:VEVENT\r\nUID:x\r\nTRANSP:OPAQUE\r\nEND:VEVENT\r\n");
        assert_eq!(opaque.row.transparency, Some(true));

        let transparent = scan("BEGIN:VEVENT\r\nUID:x\r\nTRANSP:TRANSPARENT\r\nEND:VEVENT\r\n");
        assert_eq!(transparent.row.transparency, Some(false));

        let unset = scan("BEGIN:VEVENT\r\nUID:x\r\nEND:VEVENT\r\n");
        assert_eq!(unset.row.transparency, None);
    }

    #[test]
    fn scan_normalizes_zoned_start_to_utc() {
        let scanned = scan(
            "BEGIN:VEVENT\r\nUID:x\r\nDTSTART;TZID=Europe/Moscow:20240115T120000\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            scanned.row.start_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn scan_collects_rule_and_exdates() {
        let scanned = scan(
            "BEGIN:VEVENT\r\n\
             UID:x\r\n\
             DTSTART:20240115T090000Z\r\n\
             RRULE:FREQ=DAILY;COUNT=5\r\n\
             EXDATE:20240116T090000Z,20240117T090000Z\r\n\
             END:VEVENT\r\n",
        );

        let (enc, rule_string) = scanned.rule.unwrap();
        assert_eq!(enc.by_day, Some(127));
        assert_eq!(rule_string, "FREQ=DAILY;COUNT=5");
        assert_eq!(scanned.exdates.len(), 2);
    }

    #[test]
    fn scan_captures_recurrence_id() {
        let scanned = scan(
            "BEGIN:VEVENT\r\nUID:x\r\nRECURRENCE-ID:20240116T090000Z\r\nEND:VEVENT\r\n",
        );
        assert_eq!(
            scanned.recurrence_id,
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn scan_captures_custom_props() {
        let scanned = scan(
            "BEGIN:VEVENT\r\n\
             UID:x\r\n\
             X-APPLE-TRAVEL-ADVISORY;VALUE=BOOLEAN:TRUE\r\n\
             X-PLAIN:hello\r\n\
             END:VEVENT\r\n",
        );

        assert_eq!(scanned.custom_props.len(), 2);
        assert_eq!(scanned.custom_props[0].name, "X-APPLE-TRAVEL-ADVISORY");
        assert_eq!(scanned.custom_props[0].value_type, "BOOLEAN");
        assert_eq!(scanned.custom_props[1].value_type, "DEFAULT");
        assert_eq!(scanned.custom_props[1].value, "hello");
    }

    #[test]
    fn scan_stores_duration_seconds() {
        let scanned = scan("BEGIN:VEVENT\r\nUID:x\r\nDURATION:PT1H30M\r\nEND:VEVENT\r\n");
        assert_eq!(scanned.row.duration_seconds, Some(5400));
    }

    #[test]
    fn scan_rejects_non_storable_component() {
        let component = event_from("BEGIN:VJOURNAL\r\nUID:x\r\nEND:VJOURNAL\r\n");
        let mut resolver = TimeZoneResolver::new();
        assert!(scan_component(&component, uuid::Uuid::nil(), &mut resolver).is_err());
    }
}
