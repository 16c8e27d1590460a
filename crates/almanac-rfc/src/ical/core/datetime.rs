//! iCalendar DATE-TIME value type (RFC 5545 §3.3.5).

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Which of the three RFC 5545 DATE-TIME forms a value uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeForm {
    /// Form 2: absolute time with the `Z` suffix.
    Utc,
    /// Form 1: no timezone information.
    Floating,
    /// Form 3: local time qualified by a `TZID` parameter.
    Zoned { tzid: String },
}

/// A parsed DATE-TIME value.
///
/// Keeps the civil date and time as written; the form records how it is to
/// be anchored. Conversion to UTC treats floating times as already UTC,
/// which is the storage convention for this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcalDateTime {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub form: TimeForm,
}

impl IcalDateTime {
    /// Creates a UTC date-time value.
    #[must_use]
    pub const fn utc(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time,
            form: TimeForm::Utc,
        }
    }

    /// Creates an `IcalDateTime` from a chrono UTC timestamp.
    #[must_use]
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self {
            date: dt.date_naive(),
            time: dt.time(),
            form: TimeForm::Utc,
        }
    }

    /// Parses `YYYYMMDDTHHMMSS[Z]`, taking the form from the trailing `Z`
    /// and the supplied `TZID` parameter.
    #[must_use]
    pub fn parse(s: &str, tzid: Option<&str>) -> Option<Self> {
        let (body, is_utc) = match s.strip_suffix('Z') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let naive = NaiveDateTime::parse_from_str(body, "%Y%m%dT%H%M%S").ok()?;

        let form = if is_utc {
            TimeForm::Utc
        } else if let Some(tzid) = tzid {
            TimeForm::Zoned {
                tzid: tzid.to_string(),
            }
        } else {
            TimeForm::Floating
        };

        Some(Self {
            date: naive.date(),
            time: naive.time(),
            form,
        })
    }

    /// Returns the civil date-time without anchoring.
    #[must_use]
    pub const fn naive(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date, self.time)
    }

    /// Anchors this value in UTC.
    ///
    /// UTC values map directly; floating values are taken as UTC. Zoned
    /// values need an offset the caller resolved from the accompanying
    /// VTIMEZONE; `offset_seconds` is subtracted to reach UTC.
    #[must_use]
    pub fn to_utc(&self, offset_seconds: i32) -> DateTime<Utc> {
        let naive = match &self.form {
            TimeForm::Utc | TimeForm::Floating => self.naive(),
            TimeForm::Zoned { .. } => self.naive() - chrono::Duration::seconds(i64::from(offset_seconds)),
        };
        DateTime::from_naive_utc_and_offset(naive, Utc)
    }

    /// Returns whether this value is already in UTC form.
    #[must_use]
    pub const fn is_utc(&self) -> bool {
        matches!(self.form, TimeForm::Utc)
    }
}

impl fmt::Display for IcalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.naive().format("%Y%m%dT%H%M%S"))?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// Formats a chrono UTC timestamp as `YYYYMMDDTHHMMSSZ`.
#[must_use]
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
