/// PRODID emitted for calendars the server assembles itself.
pub const SERVER_PRODID: &str = "-//Almanac//Almanac CalDAV Server//EN";

/// iCalendar VERSION the server stores and emits.
pub const ICAL_VERSION: &str = "2.0";

/// Content type for calendar object responses.
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Content type for address object responses.
pub const ADDRESSBOOK_CONTENT_TYPE: &str = "text/vcard; charset=utf-8";

/// Default component set for calendars created without one.
pub const DEFAULT_COMPONENT_SET: [&str; 3] = ["VEVENT", "VTODO", "VJOURNAL"];

/// Default max resource size for calendars created without one, in bytes.
pub const DEFAULT_MAX_RESOURCE_SIZE: i64 = 4096;
