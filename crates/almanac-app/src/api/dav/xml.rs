//! Minimal request-body extraction for the DAV methods the backend
//! terminates itself. Full WebDAV XML negotiation lives above the
//! backend boundary; these helpers pull out just the pieces the report
//! and mkcalendar handlers need.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;

use almanac_rfc::ical::core::IcalDateTime;

/// Which REPORT the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    CalendarQuery,
    CalendarMultiget,
    AddressbookMultiget,
}

/// ## Summary
/// Classifies a REPORT body by its document element.
#[must_use]
pub fn report_kind(body: &str) -> Option<ReportKind> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"calendar-query" => Some(ReportKind::CalendarQuery),
                    b"calendar-multiget" => Some(ReportKind::CalendarMultiget),
                    b"addressbook-multiget" => Some(ReportKind::AddressbookMultiget),
                    _ => None,
                };
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// ## Summary
/// Collects every `DAV:href` value of a multiget body.
#[must_use]
pub fn extract_hrefs(body: &str) -> Vec<String> {
    let mut reader = Reader::from_str(body);
    let mut hrefs = Vec::new();
    let mut in_href = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"href" => in_href = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"href" => in_href = false,
            Ok(Event::Text(t)) if in_href => {
                if let Some(text) = unescape_text(&t) {
                    let text = text.trim();
                    if !text.is_empty() {
                        hrefs.push(text.to_string());
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    hrefs
}

/// Component name and time range pulled from a calendar-query filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Innermost `comp-filter name=` that is not VCALENDAR.
    pub component: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// ## Summary
/// Extracts the component filter and time range of a calendar-query.
#[must_use]
pub fn extract_query_filter(body: &str) -> QueryFilter {
    let mut reader = Reader::from_str(body);
    let mut filter = QueryFilter::default();

    loop {
        let event = match reader.read_event() {
            Ok(Event::Eof) | Err(_) => break,
            Ok(event) => event,
        };
        let (Event::Start(e) | Event::Empty(e)) = event else {
            continue;
        };

        match e.local_name().as_ref() {
            b"comp-filter" => {
                if let Some(name) = attribute(&e, b"name")
                    && !name.eq_ignore_ascii_case("VCALENDAR")
                {
                    filter.component = Some(name);
                }
            }
            b"time-range" => {
                filter.start = attribute(&e, b"start").as_deref().and_then(parse_utc);
                filter.end = attribute(&e, b"end").as_deref().and_then(parse_utc);
            }
            _ => {}
        }
    }

    filter
}

/// ## Summary
/// Extracts the `displayname` of an MKCALENDAR/extended-MKCOL body.
#[must_use]
pub fn extract_displayname(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    let mut in_displayname = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"displayname" => {
                in_displayname = true;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"displayname" => {
                in_displayname = false;
            }
            Ok(Event::Text(t)) if in_displayname => {
                if let Some(text) = unescape_text(&t) {
                    return Some(text.trim().to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn unescape_text(t: &quick_xml::events::BytesText<'_>) -> Option<String> {
    let decoded = t.decode().ok()?;
    quick_xml::escape::unescape(&decoded)
        .ok()
        .map(|s| s.into_owned())
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.to_string())
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    IcalDateTime::parse(value, None).map(|dt| dt.to_utc(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MULTIGET: &str = "<?xml version=\"1.0\"?>\
<C:calendar-multiget xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">\
<D:prop><D:getetag/><C:calendar-data/></D:prop>\
<D:href>/alice/calendars/1/a.ics</D:href>\
<D:href>/alice/calendars/1/b.ics</D:href>\
</C:calendar-multiget>";

    const QUERY: &str = "<?xml version=\"1.0\"?>\
<C:calendar-query xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">\
<D:prop><C:calendar-data/></D:prop>\
<C:filter><C:comp-filter name=\"VCALENDAR\">\
<C:comp-filter name=\"VEVENT\">\
<C:time-range start=\"20240101T000000Z\" end=\"20241231T000000Z\"/>\
</C:comp-filter></C:comp-filter></C:filter>\
</C:calendar-query>";

    #[test]
    fn classifies_reports() {
        assert_eq!(report_kind(MULTIGET), Some(ReportKind::CalendarMultiget));
        assert_eq!(report_kind(QUERY), Some(ReportKind::CalendarQuery));
        assert_eq!(report_kind("<unknown/>"), None);
    }

    #[test]
    fn extracts_hrefs_in_order() {
        assert_eq!(
            extract_hrefs(MULTIGET),
            vec!["/alice/calendars/1/a.ics", "/alice/calendars/1/b.ics"]
        );
    }

    #[test]
    fn extracts_component_and_time_range() {
        let filter = extract_query_filter(QUERY);
        assert_eq!(filter.component.as_deref(), Some("VEVENT"));
        assert_eq!(
            filter.start,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(filter.end.is_some());
    }

    #[test]
    fn extracts_displayname() {
        let body = "<C:mkcalendar xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">\
<D:set><D:prop><D:displayname>Work</D:displayname></D:prop></D:set></C:mkcalendar>";
        assert_eq!(extract_displayname(body).as_deref(), Some("Work"));
    }

    #[test]
    fn tolerates_empty_bodies() {
        assert_eq!(report_kind(""), None);
        assert!(extract_hrefs("").is_empty());
        assert_eq!(extract_query_filter(""), QueryFilter::default());
    }
}
