//! Timezone resolution and UTC conversion for iCalendar date-times.
//!
//! TZIDs resolve against the IANA database first; VTIMEZONE components
//! shipped in the calendar cover proprietary identifiers. All stored
//! date-times go through here on the write path, after which VTIMEZONE
//! children are dropped.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use super::core::{Component, ComponentKind, ICalendar, IcalDateTime, TimeForm};

/// Error during timezone conversion.
#[derive(Debug, Error)]
pub enum TzError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid VTIMEZONE component: {0}")]
    InvalidVTimezone(String),

    #[error("Unresolvable local time: {0}")]
    UnresolvableTime(String),
}

/// One STANDARD or DAYLIGHT observance from a VTIMEZONE.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observance {
    starts: NaiveDateTime,
    offset_seconds: i32,
}

/// Offset rules extracted from a VTIMEZONE component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTimezoneRules {
    pub tzid: String,
    observances: Vec<Observance>,
}

impl VTimezoneRules {
    /// ## Summary
    /// Extracts offset rules from a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns an error when TZID is missing or no observance carries a
    /// usable DTSTART/TZOFFSETTO pair.
    pub fn parse(component: &Component) -> Result<Self, TzError> {
        let tzid = component
            .get_property("TZID")
            .and_then(|p| p.as_text())
            .ok_or_else(|| TzError::InvalidVTimezone("missing TZID".to_string()))?
            .to_string();

        let mut observances = Vec::new();
        for child in &component.children {
            if !matches!(
                child.kind,
                Some(ComponentKind::Standard | ComponentKind::Daylight)
            ) {
                continue;
            }
            let Some(starts) = child
                .get_property("DTSTART")
                .and_then(|p| p.as_datetime())
                .map(IcalDateTime::naive)
            else {
                continue;
            };
            let Some(offset_seconds) = child
                .get_property("TZOFFSETTO")
                .and_then(|p| p.as_text())
                .and_then(parse_utc_offset)
            else {
                continue;
            };
            observances.push(Observance {
                starts,
                offset_seconds,
            });
        }

        if observances.is_empty() {
            return Err(TzError::InvalidVTimezone(format!(
                "no usable observances in VTIMEZONE {tzid}"
            )));
        }

        observances.sort_by_key(|o| o.starts);
        Ok(Self { tzid, observances })
    }

    /// The offset in force at a local time: the latest observance starting
    /// at or before it, else the earliest one.
    fn offset_at(&self, local: NaiveDateTime) -> i32 {
        self.observances
            .iter()
            .rev()
            .find(|o| o.starts <= local)
            .unwrap_or(&self.observances[0])
            .offset_seconds
    }
}

/// Resolver for timezone identifiers.
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
    vtimezones: HashMap<String, VTimezoneRules>,
}

impl TimeZoneResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            vtimezones: HashMap::new(),
        }
    }

    /// Registers offset rules parsed from a VTIMEZONE.
    pub fn register_vtimezone(&mut self, rules: VTimezoneRules) {
        self.vtimezones.insert(rules.tzid.clone(), rules);
    }

    /// ## Summary
    /// Converts an iCalendar date-time to UTC.
    ///
    /// UTC and floating forms map directly (floating is stored as UTC).
    /// Zoned forms resolve their TZID against IANA first, then against a
    /// registered VTIMEZONE.
    ///
    /// ## Errors
    /// Returns an error for TZIDs that resolve nowhere.
    pub fn to_utc(&mut self, dt: &IcalDateTime) -> Result<DateTime<Utc>, TzError> {
        match &dt.form {
            TimeForm::Utc | TimeForm::Floating => Ok(dt.to_utc(0)),
            TimeForm::Zoned { tzid } => {
                let naive = dt.naive();
                if let Ok(tz) = self.resolve(tzid) {
                    return local_to_utc(tz, naive);
                }
                if let Some(rules) = self.vtimezones.get(tzid) {
                    return Ok(dt.to_utc(rules.offset_at(naive)));
                }
                Err(TzError::UnknownTimezone(tzid.clone()))
            }
        }
    }

    /// ## Summary
    /// Resolves a TZID to an IANA timezone, stripping the vendor prefixes
    /// some clients prepend.
    ///
    /// ## Errors
    /// Returns `TzError::UnknownTimezone` when the identifier is not an
    /// IANA name.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, TzError> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let stripped = tzid
            .strip_prefix("/mozilla.org/")
            .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
            .unwrap_or(tzid);

        let tz = Tz::from_str(stripped)
            .map_err(|_| TzError::UnknownTimezone(tzid.to_string()))?;

        self.cache.insert(tzid.to_string(), tz);
        Ok(tz)
    }
}

impl Default for TimeZoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// ## Summary
/// Builds a `TimeZoneResolver` with every VTIMEZONE of the calendar
/// registered.
///
/// ## Errors
/// Returns an error if any VTIMEZONE component is invalid.
pub fn build_timezone_resolver(ical: &ICalendar) -> Result<TimeZoneResolver, TzError> {
    let mut resolver = TimeZoneResolver::new();

    for tz_component in ical.timezones() {
        resolver.register_vtimezone(VTimezoneRules::parse(tz_component)?);
    }

    Ok(resolver)
}

/// Anchors a local time in a timezone, taking the earlier side of DST
/// folds and sliding forward across DST gaps.
fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>, TzError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, _) => Ok(first.with_timezone(&Utc)),
        LocalResult::None => {
            let later = naive + chrono::Duration::hours(1);
            match tz.from_local_datetime(&later) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    Ok((dt.with_timezone(&Utc)) - chrono::Duration::hours(1))
                }
                LocalResult::None => Err(TzError::UnresolvableTime(naive.to_string())),
            }
        }
    }
}

/// Parses `±HHMM[SS]` into seconds east of UTC.
fn parse_utc_offset(s: &str) -> Option<i32> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };
    if rest.len() != 4 && rest.len() != 6 {
        return None;
    }
    let hours: i32 = rest[0..2].parse().ok()?;
    let minutes: i32 = rest[2..4].parse().ok()?;
    let seconds: i32 = if rest.len() == 6 {
        rest[4..6].parse().ok()?
    } else {
        0
    };
    Some(sign * (hours * 3600 + minutes * 60 + seconds))
}
