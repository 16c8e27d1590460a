//! RRULE/EXDATE ↔ recurrence-row codec.
//!
//! The row keeps three bitmasks: `by_day` over weekdays (bit i =
//! Sunday(0)..Saturday(6), 127 = every day), `by_month_day` over month
//! days (bits 1..31, bit 0 = the synthetic last-day-of-month -1), and
//! `by_month` over months (bits 1..12). The decoder reconstructs the
//! frequency from whichever masks are present, so the two direction
//! tables here must stay exact inverses.

use chrono::{DateTime, Datelike, Utc};

use almanac_rfc::ical::core::{
    OrdWeekday, RecurFreq, RecurRule, RecurUntil, RuleWeekday, format_utc,
};

use crate::model::caldav::recurrence::{NewRecurrence, Recurrence};

/// Mask value meaning "every weekday of the week".
pub const EVERY_DAY: i32 = 127;

/// Recurrence column values scanned from a rule, before the owning
/// component id is known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedRecurrence {
    pub interval: Option<i32>,
    pub until: Option<chrono::NaiveDate>,
    pub count: Option<i32>,
    pub week_start: Option<i16>,
    pub by_day: Option<i32>,
    pub by_month_day: Option<i64>,
    pub by_month: Option<i32>,
    pub period_day: Option<i32>,
    pub by_set_pos: Option<Vec<i32>>,
    pub this_and_future: bool,
}

impl EncodedRecurrence {
    /// Binds the encoding to its master component row.
    #[must_use]
    pub fn into_row(self, event_component_id: i32) -> NewRecurrence {
        NewRecurrence {
            event_component_id,
            interval: self.interval,
            until: self.until,
            count: self.count,
            week_start: self.week_start,
            by_day: self.by_day,
            by_month_day: self.by_month_day,
            by_month: self.by_month,
            period_day: self.period_day,
            by_set_pos: self.by_set_pos,
            this_and_future: self.this_and_future,
        }
    }
}

/// ## Summary
/// Encodes a recurrence rule into the bitmask columns.
///
/// `dtstart` supplies the implied weekday for WEEKLY rules without BYDAY.
/// When BYDAY carries ordinal prefixes, only the last ordinal survives in
/// `period_day`; multiple distinct ordinals cannot be represented.
#[must_use]
pub fn encode_rule(rule: &RecurRule, dtstart: Option<DateTime<Utc>>) -> EncodedRecurrence {
    let mut enc = EncodedRecurrence {
        interval: rule.interval.and_then(|i| i32::try_from(i).ok()),
        count: rule.count.and_then(|c| i32::try_from(c).ok()),
        until: rule.until.as_ref().map(RecurUntil::date),
        this_and_future: rule.until.is_none(),
        week_start: rule.wkst.map(|w| i16::from(w.bit())),
        by_set_pos: if rule.by_set_pos.is_empty() {
            None
        } else {
            Some(rule.by_set_pos.clone())
        },
        ..EncodedRecurrence::default()
    };

    let mut weekdays: i32 = 0;
    let mut period_day: i32 = 0;

    if rule.by_day.is_empty() {
        match rule.freq {
            Some(RecurFreq::Daily) => weekdays = EVERY_DAY,
            Some(RecurFreq::Weekly) => {
                if let Some(start) = dtstart {
                    weekdays = 1 << RuleWeekday::from_chrono(start.weekday()).bit();
                }
            }
            _ => {}
        }
    } else {
        for day in &rule.by_day {
            weekdays |= 1 << day.weekday.bit();
            period_day = day.ordinal.unwrap_or(0);
        }
    }

    let mut months: i32 = 0;
    for month in &rule.by_month {
        months |= 1 << month;
    }

    let mut month_days: i64 = 0;
    for day in &rule.by_month_day {
        if (1..=31).contains(day) {
            month_days |= 1 << day;
        } else {
            // -1 and anything else out of range folds into the
            // last-day-of-month bit
            month_days |= 1;
        }
    }

    if weekdays != 0 {
        enc.by_day = Some(weekdays);
    }
    if period_day != 0 {
        enc.period_day = Some(period_day);
    }
    if months != 0 {
        enc.by_month = Some(months);
    }
    if month_days != 0 {
        enc.by_month_day = Some(month_days);
    }

    enc
}

/// ## Summary
/// Decodes a recurrence row back into a rule.
///
/// Frequency comes from the masks: `by_month` wins as YEARLY, then
/// `by_month_day` as MONTHLY, then `by_day` as WEEKLY (or DAILY when the
/// mask is 127 on its own). Returns `None` when no mask survives, which
/// means the stored row does not describe a reconstructable rule.
#[must_use]
pub fn decode_row(row: &Recurrence) -> Option<RecurRule> {
    let mut rule = RecurRule {
        interval: row.interval.and_then(|i| u32::try_from(i).ok()),
        count: row.count.and_then(|c| u32::try_from(c).ok()),
        until: row.until.map(RecurUntil::Date),
        wkst: row
            .week_start
            .and_then(|w| u8::try_from(w).ok())
            .and_then(RuleWeekday::from_bit),
        by_set_pos: row.by_set_pos.clone().unwrap_or_default(),
        ..RecurRule::default()
    };

    let plain_daily = row.by_day == Some(EVERY_DAY)
        && row.by_month_day.is_none()
        && row.by_month.is_none();

    if let Some(mask) = row.by_day
        && !plain_daily
    {
        for day in RuleWeekday::all() {
            if mask & (1 << day.bit()) != 0 {
                rule.by_day.push(match row.period_day {
                    Some(ordinal) => OrdWeekday::nth(ordinal, day),
                    None => OrdWeekday::every(day),
                });
            }
        }
    }

    if let Some(mask) = row.by_month_day {
        if mask & 1 != 0 {
            rule.by_month_day.push(-1);
        }
        for day in 1..=31 {
            if mask & (1 << day) != 0 {
                rule.by_month_day.push(day);
            }
        }
    }

    if let Some(mask) = row.by_month {
        for month in 1..=12u32 {
            if mask & (1 << month) != 0 {
                rule.by_month.push(month);
            }
        }
    }

    rule.freq = if !rule.by_month.is_empty() {
        Some(RecurFreq::Yearly)
    } else if !rule.by_month_day.is_empty() {
        Some(RecurFreq::Monthly)
    } else if plain_daily {
        Some(RecurFreq::Daily)
    } else if !rule.by_day.is_empty() {
        Some(RecurFreq::Weekly)
    } else {
        None
    };

    rule.freq?;
    Some(rule)
}

/// ## Summary
/// Formats EXDATE values into the single comma-joined property value the
/// decoder emits: `YYYYMMDDTHHMMSSZ[,...]`.
#[must_use]
pub fn format_exdates(dates: &[DateTime<Utc>]) -> String {
    dates
        .iter()
        .map(|d| format_utc(*d))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row_from(enc: EncodedRecurrence) -> Recurrence {
        let new = enc.into_row(1);
        Recurrence {
            id: 1,
            event_component_id: new.event_component_id,
            interval: new.interval,
            until: new.until,
            count: new.count,
            week_start: new.week_start,
            by_day: new.by_day,
            by_month_day: new.by_month_day,
            by_month: new.by_month,
            period_day: new.period_day,
            by_set_pos: new.by_set_pos,
            this_and_future: new.this_and_future,
        }
    }

    fn parse(rule: &str) -> RecurRule {
        RecurRule::parse(rule).unwrap()
    }

    #[test]
    fn daily_count_encodes_to_full_mask() {
        let enc = encode_rule(&parse("FREQ=DAILY;COUNT=10"), None);
        assert_eq!(enc.by_day, Some(EVERY_DAY));
        assert_eq!(enc.count, Some(10));
        assert!(enc.this_and_future);
    }

    #[test]
    fn daily_count_roundtrips() {
        let enc = encode_rule(&parse("FREQ=DAILY;COUNT=10"), None);
        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn workdays_until_encodes_mask_and_flag() {
        let enc = encode_rule(
            &parse("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231T235959Z"),
            None,
        );
        assert_eq!(enc.by_day, Some(0b011_1110));
        assert!(enc.until.is_some());
        assert!(!enc.this_and_future);
    }

    #[test]
    fn workdays_roundtrip_loses_until_time_only() {
        let enc = encode_rule(
            &parse("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231T235959Z"),
            None,
        );
        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(
            decoded.to_string(),
            "FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20241231"
        );
    }

    #[test]
    fn weekly_without_byday_uses_dtstart_weekday() {
        // 2024-01-15 is a Monday
        let dtstart = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let enc = encode_rule(&parse("FREQ=WEEKLY;COUNT=4"), Some(dtstart));
        assert_eq!(enc.by_day, Some(1 << RuleWeekday::Monday.bit()));

        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.to_string(), "FREQ=WEEKLY;BYDAY=MO;COUNT=4");
    }

    #[test]
    fn ordinal_byday_stores_period_day() {
        let enc = encode_rule(&parse("FREQ=MONTHLY;BYDAY=-2FR;BYMONTHDAY=1"), None);
        assert_eq!(enc.period_day, Some(-2));
        assert_eq!(enc.by_day, Some(1 << RuleWeekday::Friday.bit()));
    }

    #[test]
    fn last_ordinal_wins() {
        // One period_day column: the second ordinal overwrites the first.
        let enc = encode_rule(&parse("FREQ=MONTHLY;BYDAY=1MO,-1FR"), None);
        assert_eq!(enc.period_day, Some(-1));
        assert_eq!(
            enc.by_day,
            Some((1 << RuleWeekday::Monday.bit()) | (1 << RuleWeekday::Friday.bit()))
        );
    }

    #[test]
    fn monthly_minus_one_folds_into_bit_zero() {
        let enc = encode_rule(&parse("FREQ=MONTHLY;BYMONTHDAY=-1"), None);
        assert_eq!(enc.by_month_day, Some(1));

        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.to_string(), "FREQ=MONTHLY;BYMONTHDAY=-1");
    }

    #[test]
    fn monthly_days_roundtrip() {
        let enc = encode_rule(&parse("FREQ=MONTHLY;BYMONTHDAY=1,15,31"), None);
        assert_eq!(enc.by_month_day, Some((1 << 1) | (1 << 15) | (1_i64 << 31)));

        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.to_string(), "FREQ=MONTHLY;BYMONTHDAY=1,15,31");
    }

    #[test]
    fn yearly_months_roundtrip() {
        let enc = encode_rule(&parse("FREQ=YEARLY;BYMONTH=1,7,12"), None);
        assert_eq!(enc.by_month, Some((1 << 1) | (1 << 7) | (1 << 12)));

        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.to_string(), "FREQ=YEARLY;BYMONTH=1,7,12");
    }

    #[test]
    fn interval_and_wkst_roundtrip() {
        let enc = encode_rule(&parse("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU;WKST=SU"), None);
        assert_eq!(enc.interval, Some(2));
        assert_eq!(enc.week_start, Some(0));

        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.to_string(), "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU;WKST=SU");
    }

    #[test]
    fn by_set_pos_stored_verbatim() {
        let enc = encode_rule(&parse("FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1,-1"), None);
        assert_eq!(enc.by_set_pos, Some(vec![1, -1]));

        let decoded = decode_row(&row_from(enc)).unwrap();
        assert_eq!(decoded.by_set_pos, vec![1, -1]);
    }

    #[test]
    fn empty_row_decodes_to_none() {
        let row = row_from(EncodedRecurrence::default());
        assert!(decode_row(&row).is_none());
    }

    #[test]
    fn format_exdates_joins_utc() {
        let dates = vec![
            Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap(),
        ];
        assert_eq!(
            format_exdates(&dates),
            "20240116T090000Z,20240117T090000Z"
        );
    }
}
