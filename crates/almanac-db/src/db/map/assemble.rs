//! Read-side codec: loaded rows back into an iCalendar object graph.

use chrono::{DateTime, Utc};

use almanac_rfc::ical::core::{
    Component, ICalendar, IcalDateTime, IcalDuration, Parameter, Property, Value,
};

use super::recurrence::{decode_row, format_exdates};
use crate::model::caldav::component::EventComponent;
use crate::model::caldav::custom_prop::CustomProperty;
use crate::model::caldav::file::CalendarProperty;
use crate::model::caldav::recurrence::Recurrence;

/// One component's rows, joined for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredComponent {
    pub row: EventComponent,
    pub recurrence: Option<Recurrence>,
    /// Set-bit exception rows: dates the series skips.
    pub exdates: Vec<DateTime<Utc>>,
    /// The RECURRENCE-ID this component carries, resolved from the
    /// unset-bit exception row that points at it.
    pub recurrence_id: Option<DateTime<Utc>>,
    pub custom_props: Vec<CustomProperty>,
}

/// ## Summary
/// Assembles a calendar from its stored rows.
///
/// Components re-emit their scalar columns in canonical order, recurrence
/// rows decode back to RRULE, set-bit exceptions become one comma-joined
/// EXDATE, and override components get their RECURRENCE-ID attached.
#[must_use]
pub fn assemble(uid: &str, header: &CalendarProperty, components: &[StoredComponent]) -> ICalendar {
    let mut root = Component::calendar();
    root.add_property(Property::text("VERSION", &header.version));
    root.add_property(Property::text("PRODID", &header.product));
    if let Some(scale) = &header.scale {
        root.add_property(Property::text("CALSCALE", scale));
    }
    if let Some(method) = &header.method {
        root.add_property(Property::text("METHOD", method));
    }

    for stored in components {
        root.add_child(assemble_component(uid, stored));
    }

    ICalendar { root }
}

fn assemble_component(uid: &str, stored: &StoredComponent) -> Component {
    let row = &stored.row;
    let mut component = if row.component_type {
        Component::event()
    } else {
        Component::todo()
    };

    component.add_property(Property::text("UID", uid));

    add_time(&mut component, "DTSTAMP", row.date_timestamp);
    add_time(&mut component, "DTSTART", row.start_date);
    add_time(&mut component, "DTEND", row.end_date);

    if let Some(seconds) = row.duration_seconds {
        let d = IcalDuration::from_seconds(seconds);
        component.add_property(Property::with_value(
            "DURATION",
            Value::Duration(d),
            d.to_string(),
        ));
    }

    if let Some(recurrence) = &stored.recurrence
        && let Some(rule) = decode_row(recurrence)
    {
        component.add_property(Property::with_value(
            "RRULE",
            Value::Recur(rule.clone()),
            rule.to_string(),
        ));
    }

    if !stored.exdates.is_empty() {
        let raw = format_exdates(&stored.exdates);
        let list = stored.exdates.iter().map(|d| IcalDateTime::from_utc(*d)).collect();
        component.add_property(Property::with_value(
            "EXDATE",
            Value::DateTimeList(list),
            raw,
        ));
    }

    if let Some(recurrence_id) = stored.recurrence_id {
        add_time(&mut component, "RECURRENCE-ID", Some(recurrence_id));
    }

    add_text(&mut component, "SUMMARY", row.summary.as_deref());
    add_text(&mut component, "DESCRIPTION", row.description.as_deref());
    add_text(&mut component, "LOCATION", row.location.as_deref());
    add_text(&mut component, "CLASS", row.class.as_deref());
    add_text(&mut component, "STATUS", row.status.as_deref());
    add_int(&mut component, "PRIORITY", row.priority);

    if let Some(opaque) = row.transparency {
        let transp = if opaque { "OPAQUE" } else { "TRANSPARENT" };
        component.add_property(Property::text("TRANSP", transp));
    }

    add_raw(&mut component, "ORGANIZER", row.organizer.as_deref());
    add_raw(&mut component, "CATEGORIES", row.categories.as_deref());
    add_raw(&mut component, "URL", row.url.as_deref());

    add_time(&mut component, "COMPLETED", row.completed);
    add_int(&mut component, "PERCENT-COMPLETE", row.percent_complete);
    add_time(&mut component, "CREATED", row.created_at);
    add_time(&mut component, "LAST-MODIFIED", row.last_modified_at);
    add_int(&mut component, "SEQUENCE", row.sequence);

    for prop in &stored.custom_props {
        component.add_property(assemble_custom_prop(prop));
    }

    component
}

/// Rebuilds an X-* property from its stored (name, declared type, value)
/// triple. Declared types reconstruct directly and re-emit their `VALUE=`
/// parameter; `DEFAULT` gets a best-effort coercion (date-time, then
/// integer, then float, then boolean, then text), acknowledged lossy.
fn assemble_custom_prop(prop: &CustomProperty) -> Property {
    let raw = prop.value.clone();
    let declared = prop.parameter_name.as_str();

    let value = match declared {
        "INTEGER" => raw.parse::<i32>().map_or_else(|_| Value::Unknown(raw.clone()), Value::Integer),
        "FLOAT" => raw.parse::<f64>().map_or_else(|_| Value::Unknown(raw.clone()), Value::Float),
        "BOOLEAN" => match raw.to_ascii_uppercase().as_str() {
            "TRUE" => Value::Boolean(true),
            "FALSE" => Value::Boolean(false),
            _ => Value::Unknown(raw.clone()),
        },
        "DATE-TIME" => IcalDateTime::parse(&raw, None)
            .map_or_else(|| Value::Unknown(raw.clone()), Value::DateTime),
        "DEFAULT" => coerce_default(&raw),
        // TEXT, BINARY, and anything else pass the stored text through
        _ => Value::Unknown(raw.clone()),
    };

    let mut property = Property::with_value(&prop.prop_name, value, raw);
    if declared != "DEFAULT" {
        property.add_param(Parameter::value_type(declared));
    }
    property
}

/// Best-effort typing for DEFAULT-tagged values.
fn coerce_default(raw: &str) -> Value {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Value::DateTime(IcalDateTime::from_utc(dt.with_timezone(&Utc)));
    }
    if let Some(dt) = IcalDateTime::parse(raw, None) {
        return Value::DateTime(dt);
    }
    if let Ok(i) = raw.parse::<i32>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    match raw.to_ascii_uppercase().as_str() {
        "TRUE" => Value::Boolean(true),
        "FALSE" => Value::Boolean(false),
        _ => Value::Unknown(raw.to_string()),
    }
}

fn add_text(component: &mut Component, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        component.add_property(Property::text(name, value));
    }
}

fn add_raw(component: &mut Component, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        component.add_property(Property::with_value(name, Value::Unknown(value.to_string()), value));
    }
}

fn add_int(component: &mut Component, name: &str, value: Option<i32>) {
    if let Some(value) = value {
        component.add_property(Property::integer(name, value));
    }
}

fn add_time(component: &mut Component, name: &str, value: Option<DateTime<Utc>>) {
    if let Some(value) = value {
        component.add_property(Property::datetime(name, IcalDateTime::from_utc(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::map::recurrence::encode_rule;
    use crate::db::map::scan::scan_component;
    use almanac_rfc::ical::build::serialize;
    use almanac_rfc::ical::core::{ComponentKind, RecurRule};
    use almanac_rfc::ical::parse::parse;
    use almanac_rfc::ical::tz::TimeZoneResolver;
    use chrono::TimeZone;

    fn header(uid: uuid::Uuid) -> CalendarProperty {
        CalendarProperty {
            calendar_file_uid: uid,
            version: "2.0".to_string(),
            product: "-//Test//Test//EN".to_string(),
            scale: None,
            method: None,
        }
    }

    fn stored_from(body: &str) -> StoredComponent {
        let input = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n{body}END:VCALENDAR\r\n"
        );
        let ical = parse(&input).unwrap();
        let mut resolver = TimeZoneResolver::new();
        let scanned = scan_component(&ical.root.children[0], uuid::Uuid::nil(), &mut resolver).unwrap();

        let new = scanned.row;
        let recurrence = scanned.rule.map(|(enc, _)| {
            let row = enc.into_row(1);
            Recurrence {
                id: 1,
                event_component_id: row.event_component_id,
                interval: row.interval,
                until: row.until,
                count: row.count,
                week_start: row.week_start,
                by_day: row.by_day,
                by_month_day: row.by_month_day,
                by_month: row.by_month,
                period_day: row.period_day,
                by_set_pos: row.by_set_pos,
                this_and_future: row.this_and_future,
            }
        });

        StoredComponent {
            row: EventComponent {
                id: 1,
                calendar_file_uid: new.calendar_file_uid,
                component_type: new.component_type,
                date_timestamp: new.date_timestamp,
                created_at: new.created_at,
                last_modified_at: new.last_modified_at,
                summary: new.summary,
                description: new.description,
                url: new.url,
                organizer: new.organizer,
                start_date: new.start_date,
                end_date: new.end_date,
                duration_seconds: new.duration_seconds,
                all_day: new.all_day,
                class: new.class,
                location: new.location,
                priority: new.priority,
                sequence: new.sequence,
                status: new.status,
                categories: new.categories,
                transparency: new.transparency,
                completed: new.completed,
                percent_complete: new.percent_complete,
            },
            recurrence,
            exdates: scanned.exdates,
            recurrence_id: scanned.recurrence_id,
            custom_props: scanned
                .custom_props
                .into_iter()
                .map(|p| CustomProperty {
                    calendar_file_uid: uuid::Uuid::nil(),
                    parent_id: 1,
                    prop_name: p.name,
                    parameter_name: p.value_type,
                    value: p.value,
                })
                .collect(),
        }
    }

    #[test]
    fn scan_then_assemble_is_byte_stable() {
        let body = "\
BEGIN:VEVENT\r\n\
UID:00000000-0000-0000-0000-000000000000\r\n\
DTSTAMP:20240114T120000Z\r\n\
DTSTART:20240115T090000Z\r\n\
DTEND:20240115T100000Z\r\n\
SUMMARY:Meeting\r\n\
END:VEVENT\r\n";
        let stored = stored_from(body);

        let ical = assemble(
            "00000000-0000-0000-0000-000000000000",
            &header(uuid::Uuid::nil()),
            std::slice::from_ref(&stored),
        );
        let output = serialize(&ical);

        let expected = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n{body}END:VCALENDAR\r\n"
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn recurrence_row_decodes_into_rrule_property() {
        let stored = stored_from(
            "BEGIN:VEVENT\r\n\
             UID:00000000-0000-0000-0000-000000000000\r\n\
             DTSTART:20240115T090000Z\r\n\
             RRULE:FREQ=DAILY;COUNT=10\r\n\
             END:VEVENT\r\n",
        );

        let ical = assemble("u", &header(uuid::Uuid::nil()), &[stored]);
        let event = &ical.root.children[0];
        let rrule = event.get_property("RRULE").unwrap();
        assert_eq!(rrule.raw_value, "FREQ=DAILY;COUNT=10");
        assert!(matches!(rrule.value, Value::Recur(_)));
    }

    #[test]
    fn exception_rows_become_exdate_property() {
        let stored = StoredComponent {
            exdates: vec![
                Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap(),
            ],
            ..stored_from(
                "BEGIN:VEVENT\r\n\
                 UID:u\r\n\
                 DTSTART:20240115T090000Z\r\n\
                 RRULE:FREQ=DAILY;COUNT=10\r\n\
                 END:VEVENT\r\n",
            )
        };

        let ical = assemble("u", &header(uuid::Uuid::nil()), &[stored]);
        let event = &ical.root.children[0];
        assert_eq!(
            event.get_property("EXDATE").unwrap().raw_value,
            "20240116T090000Z,20240117T090000Z"
        );
    }

    #[test]
    fn override_gets_recurrence_id() {
        let stored = StoredComponent {
            recurrence_id: Some(Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap()),
            ..stored_from("BEGIN:VEVENT\r\nUID:u\r\nSUMMARY:Moved\r\nEND:VEVENT\r\n")
        };

        let ical = assemble("u", &header(uuid::Uuid::nil()), &[stored]);
        let event = &ical.root.children[0];
        assert_eq!(
            event.get_property("RECURRENCE-ID").unwrap().raw_value,
            "20240116T090000Z"
        );
    }

    #[test]
    fn declared_custom_prop_roundtrips_with_value_param() {
        let stored = stored_from(
            "BEGIN:VEVENT\r\n\
             UID:u\r\n\
             X-SCORE;VALUE=INTEGER:42\r\n\
             END:VEVENT\r\n",
        );

        let ical = assemble("u", &header(uuid::Uuid::nil()), &[stored]);
        let event = &ical.root.children[0];
        let prop = event.get_property("X-SCORE").unwrap();
        assert_eq!(prop.value, Value::Integer(42));
        assert_eq!(prop.get_param_value("VALUE"), Some("INTEGER"));
    }

    #[test]
    fn default_custom_prop_coerces_lossily() {
        assert!(matches!(coerce_default("2024-01-15T09:00:00Z"), Value::DateTime(_)));
        assert!(matches!(coerce_default("20240115T090000Z"), Value::DateTime(_)));
        assert_eq!(coerce_default("42"), Value::Integer(42));
        assert_eq!(coerce_default("4.5"), Value::Float(4.5));
        assert_eq!(coerce_default("TRUE"), Value::Boolean(true));
        assert_eq!(coerce_default("plain"), Value::Unknown("plain".to_string()));
    }

    #[test]
    fn transparency_bit_emits_transp() {
        let stored = stored_from("BEGIN:VEVENT\r\nUID:u\r\nTRANSP:OPAQUE\r\nEND:VEVENT\r\n");
        let ical = assemble("u", &header(uuid::Uuid::nil()), &[stored]);
        assert_eq!(
            ical.root.children[0].get_property("TRANSP").unwrap().as_text(),
            Some("OPAQUE")
        );
    }

    #[test]
    fn todo_row_assembles_as_vtodo() {
        let stored = stored_from(
            "BEGIN:VTODO\r\nUID:u\r\nPERCENT-COMPLETE:60\r\nSTATUS:IN-PROCESS\r\nEND:VTODO\r\n",
        );
        let ical = assemble("u", &header(uuid::Uuid::nil()), &[stored]);
        let todo = &ical.root.children[0];
        assert_eq!(todo.kind, Some(ComponentKind::Todo));
        assert_eq!(
            todo.get_property("PERCENT-COMPLETE").unwrap().as_integer(),
            Some(60)
        );
    }

    #[test]
    fn full_recurrence_roundtrip_through_rows() {
        let rule = RecurRule::parse("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231T235959Z")
            .unwrap();
        let enc = encode_rule(&rule, None);
        assert_eq!(enc.by_day, Some(0b011_1110));
        assert!(!enc.this_and_future);
    }
}
