//! iCalendar RECUR value type (RFC 5545 §3.3.10).

use std::fmt;

use chrono::NaiveDate;

use super::IcalDateTime;

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecurFreq {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurFreq {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for RecurFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week in the civil-calendar enumeration, Sunday first.
///
/// The bitmask the storage layer keeps uses the same enumeration: bit i
/// corresponds to ordinal i. The two direction tables (`bit` and
/// `from_bit`) must stay inverses of each other or stored rules stop
/// round-tripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleWeekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl RuleWeekday {
    /// Returns the two-letter RRULE abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }

    /// Ordinal in the Sunday(0)..Saturday(6) enumeration.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }

    /// Inverse of [`RuleWeekday::bit`].
    #[must_use]
    pub const fn from_bit(bit: u8) -> Option<Self> {
        Some(match bit {
            0 => Self::Sunday,
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            _ => return None,
        })
    }

    /// Maps from chrono's Monday-first enumeration.
    #[must_use]
    pub const fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Self::Sunday,
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
        }
    }

    /// All weekdays in bit order.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Sunday,
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
        ]
    }
}

impl fmt::Display for RuleWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BYDAY entry: a weekday with an optional ordinal prefix (`MO`, `1MO`, `-2FR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdWeekday {
    pub ordinal: Option<i32>,
    pub weekday: RuleWeekday,
}

impl OrdWeekday {
    /// A weekday without an ordinal.
    #[must_use]
    pub const fn every(weekday: RuleWeekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// A weekday with an ordinal.
    #[must_use]
    pub const fn nth(ordinal: i32, weekday: RuleWeekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }

    /// Parses `[[+|-]n]WD`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() < 2 {
            return None;
        }
        let (num, day) = s.split_at(s.len() - 2);
        let weekday = RuleWeekday::parse(day)?;
        let ordinal = if num.is_empty() {
            None
        } else {
            let n: i32 = num.parse().ok()?;
            if n == 0 {
                return None;
            }
            Some(n)
        };
        Some(Self { ordinal, weekday })
    }
}

impl fmt::Display for OrdWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// UNTIL boundary: either a DATE or a DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurUntil {
    Date(NaiveDate),
    DateTime(IcalDateTime),
}

impl RecurUntil {
    /// Parses either form, preferring DATE-TIME when a `T` is present.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.contains('T') {
            IcalDateTime::parse(s, None).map(Self::DateTime)
        } else {
            NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(Self::Date)
        }
    }

    /// The civil date of the boundary.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Date(d) => *d,
            Self::DateTime(dt) => dt.date,
        }
    }
}

impl fmt::Display for RecurUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// A recurrence rule, restricted to the parts the storage schema encodes.
///
/// BYSECOND/BYMINUTE/BYHOUR/BYYEARDAY/BYWEEKNO have no relational column
/// and are rejected upstream by validation rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecurRule {
    pub freq: Option<RecurFreq>,
    pub interval: Option<u32>,
    pub count: Option<u32>,
    pub until: Option<RecurUntil>,
    pub wkst: Option<RuleWeekday>,
    pub by_day: Vec<OrdWeekday>,
    pub by_month_day: Vec<i32>,
    pub by_month: Vec<u32>,
    pub by_set_pos: Vec<i32>,
}

impl RecurRule {
    /// Parses a RECUR value (`FREQ=WEEKLY;BYDAY=MO,FR;COUNT=4`), accepting
    /// the parts in any order. Unknown parts fail the parse.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut rule = Self::default();

        for part in s.split(';') {
            if part.is_empty() {
                continue;
            }
            let (key, value) = part.split_once('=')?;
            match key.to_ascii_uppercase().as_str() {
                "FREQ" => rule.freq = Some(RecurFreq::parse(value)?),
                "INTERVAL" => rule.interval = Some(value.parse().ok()?),
                "COUNT" => rule.count = Some(value.parse().ok()?),
                "UNTIL" => rule.until = Some(RecurUntil::parse(value)?),
                "WKST" => rule.wkst = Some(RuleWeekday::parse(value)?),
                "BYDAY" => {
                    for day in value.split(',') {
                        rule.by_day.push(OrdWeekday::parse(day)?);
                    }
                }
                "BYMONTHDAY" => {
                    for day in value.split(',') {
                        rule.by_month_day.push(day.parse().ok()?);
                    }
                }
                "BYMONTH" => {
                    for month in value.split(',') {
                        let m: u32 = month.parse().ok()?;
                        if !(1..=12).contains(&m) {
                            return None;
                        }
                        rule.by_month.push(m);
                    }
                }
                "BYSETPOS" => {
                    for pos in value.split(',') {
                        rule.by_set_pos.push(pos.parse().ok()?);
                    }
                }
                _ => return None,
            }
        }

        rule.freq?;
        Some(rule)
    }
}

impl fmt::Display for RecurRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(freq) = self.freq {
            parts.push(format!("FREQ={freq}"));
        }
        if let Some(interval) = self.interval
            && interval != 1
        {
            parts.push(format!("INTERVAL={interval}"));
        }
        if !self.by_day.is_empty() {
            let s: Vec<_> = self.by_day.iter().map(ToString::to_string).collect();
            parts.push(format!("BYDAY={}", s.join(",")));
        }
        if !self.by_month_day.is_empty() {
            let s: Vec<_> = self.by_month_day.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMONTHDAY={}", s.join(",")));
        }
        if !self.by_month.is_empty() {
            let s: Vec<_> = self.by_month.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMONTH={}", s.join(",")));
        }
        if !self.by_set_pos.is_empty() {
            let s: Vec<_> = self.by_set_pos.iter().map(ToString::to_string).collect();
            parts.push(format!("BYSETPOS={}", s.join(",")));
        }
        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }
        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }
        if let Some(wkst) = self.wkst {
            parts.push(format!("WKST={wkst}"));
        }

        f.write_str(&parts.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_daily_count() {
        let rule = RecurRule::parse("FREQ=DAILY;COUNT=10").unwrap();
        assert_eq!(rule.freq, Some(RecurFreq::Daily));
        assert_eq!(rule.count, Some(10));
        assert_eq!(rule.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn parse_workday_until() {
        let rule =
            RecurRule::parse("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231T235959Z").unwrap();
        assert_eq!(rule.by_day.len(), 5);
        assert_eq!(rule.by_day[0], OrdWeekday::every(RuleWeekday::Monday));
        assert!(matches!(rule.until, Some(RecurUntil::DateTime(_))));
        assert_eq!(
            rule.to_string(),
            "FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231T235959Z"
        );
    }

    #[test]
    fn parse_ordinal_byday() {
        let rule = RecurRule::parse("FREQ=MONTHLY;BYDAY=-2FR").unwrap();
        assert_eq!(rule.by_day[0], OrdWeekday::nth(-2, RuleWeekday::Friday));
        assert_eq!(rule.to_string(), "FREQ=MONTHLY;BYDAY=-2FR");
    }

    #[test]
    fn parse_accepts_any_part_order() {
        let rule = RecurRule::parse("COUNT=3;FREQ=YEARLY;BYMONTH=1,7").unwrap();
        assert_eq!(rule.freq, Some(RecurFreq::Yearly));
        assert_eq!(rule.by_month, vec![1, 7]);
        assert_eq!(rule.to_string(), "FREQ=YEARLY;BYMONTH=1,7;COUNT=3");
    }

    #[test]
    fn parse_rejects_missing_freq() {
        assert!(RecurRule::parse("COUNT=3").is_none());
    }

    #[test]
    fn parse_rejects_unknown_part() {
        assert!(RecurRule::parse("FREQ=DAILY;BYHOUR=3").is_none());
    }

    #[test]
    fn parse_rejects_month_out_of_range() {
        assert!(RecurRule::parse("FREQ=YEARLY;BYMONTH=13").is_none());
    }

    #[test]
    fn interval_one_is_omitted() {
        let rule = RecurRule::parse("FREQ=DAILY;INTERVAL=1").unwrap();
        assert_eq!(rule.to_string(), "FREQ=DAILY");
    }

    #[test]
    fn weekday_bit_tables_are_inverse() {
        for day in RuleWeekday::all() {
            assert_eq!(RuleWeekday::from_bit(day.bit()), Some(day));
        }
        assert!(RuleWeekday::from_bit(7).is_none());
    }

    #[test]
    fn until_date_form() {
        let rule = RecurRule::parse("FREQ=DAILY;UNTIL=20241231").unwrap();
        assert!(matches!(rule.until, Some(RecurUntil::Date(_))));
        assert_eq!(rule.to_string(), "FREQ=DAILY;UNTIL=20241231");
    }
}
