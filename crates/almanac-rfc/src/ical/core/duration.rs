//! iCalendar DURATION value type (RFC 5545 §3.3.6).

use std::fmt;

/// A signed nominal duration (`P15DT5H0M20S`, `-PT10M`, `P7W`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IcalDuration {
    pub negative: bool,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl IcalDuration {
    /// Creates a duration from a whole number of seconds.
    #[must_use]
    pub fn from_seconds(total: i64) -> Self {
        let negative = total < 0;
        let mut rest = total.unsigned_abs();

        let days = u32::try_from(rest / 86_400).unwrap_or(u32::MAX);
        rest %= 86_400;
        let hours = u32::try_from(rest / 3600).unwrap_or(0);
        rest %= 3600;
        let minutes = u32::try_from(rest / 60).unwrap_or(0);
        let seconds = u32::try_from(rest % 60).unwrap_or(0);

        Self {
            negative,
            weeks: 0,
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// Total length in seconds, negative if the duration is negative.
    #[must_use]
    pub fn total_seconds(&self) -> i64 {
        let magnitude = i64::from(self.weeks) * 7 * 86_400
            + i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        if self.negative { -magnitude } else { magnitude }
    }

    /// Parses an RFC 5545 duration string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars().peekable();
        let mut out = Self::default();

        match chars.peek() {
            Some('-') => {
                out.negative = true;
                chars.next();
            }
            Some('+') => {
                chars.next();
            }
            _ => {}
        }

        if chars.next() != Some('P') {
            return None;
        }

        let mut in_time = false;
        let mut number = String::new();
        let mut saw_part = false;

        for c in chars {
            match c {
                'T' => {
                    if !number.is_empty() {
                        return None;
                    }
                    in_time = true;
                }
                '0'..='9' => number.push(c),
                'W' | 'D' | 'H' | 'M' | 'S' => {
                    let value: u32 = number.parse().ok()?;
                    number.clear();
                    saw_part = true;
                    match (c, in_time) {
                        ('W', false) => out.weeks = value,
                        ('D', false) => out.days = value,
                        ('H', true) => out.hours = value,
                        ('M', true) => out.minutes = value,
                        ('S', true) => out.seconds = value,
                        _ => return None,
                    }
                }
                _ => return None,
            }
        }

        if !number.is_empty() || !saw_part {
            return None;
        }

        Some(out)
    }
}

impl fmt::Display for IcalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;

        if self.weeks > 0 {
            return write!(f, "{}W", self.weeks);
        }

        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }

        let has_time = self.hours > 0 || self.minutes > 0 || self.seconds > 0;
        if has_time {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.days == 0 {
            // Zero duration
            write!(f, "T0S")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_day_time() {
        let d = IcalDuration::parse("P15DT5H0M20S").unwrap();
        assert_eq!(d.days, 15);
        assert_eq!(d.hours, 5);
        assert_eq!(d.seconds, 20);
        assert!(!d.negative);
    }

    #[test]
    fn parse_weeks() {
        let d = IcalDuration::parse("P7W").unwrap();
        assert_eq!(d.weeks, 7);
        assert_eq!(d.to_string(), "P7W");
    }

    #[test]
    fn parse_negative() {
        let d = IcalDuration::parse("-PT10M").unwrap();
        assert!(d.negative);
        assert_eq!(d.total_seconds(), -600);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(IcalDuration::parse("P").is_none());
        assert!(IcalDuration::parse("15D").is_none());
        assert!(IcalDuration::parse("PT5X").is_none());
        assert!(IcalDuration::parse("P5H").is_none());
    }

    #[test]
    fn seconds_roundtrip() {
        let d = IcalDuration::from_seconds(90_061);
        assert_eq!(d.total_seconds(), 90_061);
        assert_eq!(d.to_string(), "P1DT1H1M1S");
    }

    #[test]
    fn display_one_hour() {
        let d = IcalDuration::from_seconds(3600);
        assert_eq!(d.to_string(), "PT1H");
    }
}
