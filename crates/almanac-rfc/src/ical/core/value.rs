//! iCalendar property value types (RFC 5545 §3.3).

use chrono::NaiveDate;

use super::{IcalDateTime, IcalDuration, RecurRule};

/// A parsed property value.
///
/// Restricted to the types the relational codec persists; anything the
/// parser cannot type lands in `Unknown` with the raw text preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    TextList(Vec<String>),
    Integer(i32),
    Float(f64),
    Boolean(bool),
    Uri(String),
    Date(NaiveDate),
    DateTime(IcalDateTime),
    DateTimeList(Vec<IcalDateTime>),
    Duration(IcalDuration),
    Recur(RecurRule),
    Binary(String),
    Unknown(String),
}

impl Value {
    /// Returns the text content for `Text`, `Uri`, and `Unknown` values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Uri(s) | Self::Unknown(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content if this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the date-time content if this is a date-time value.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<&IcalDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the duration content if this is a duration value.
    #[must_use]
    pub const fn as_duration(&self) -> Option<&IcalDuration> {
        match self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the recurrence rule if this is a RECUR value.
    #[must_use]
    pub const fn as_recur(&self) -> Option<&RecurRule> {
        match self {
            Self::Recur(r) => Some(r),
            _ => None,
        }
    }

    /// The `VALUE=` parameter name for this value's type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) | Self::TextList(_) | Self::Unknown(_) => "TEXT",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Uri(_) => "URI",
            Self::Date(_) => "DATE",
            Self::DateTime(_) | Self::DateTimeList(_) => "DATE-TIME",
            Self::Duration(_) => "DURATION",
            Self::Recur(_) => "RECUR",
            Self::Binary(_) => "BINARY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_text_covers_uri_and_unknown() {
        assert_eq!(Value::Text("a".into()).as_text(), Some("a"));
        assert_eq!(Value::Uri("mailto:x".into()).as_text(), Some("mailto:x"));
        assert_eq!(Value::Unknown("raw".into()).as_text(), Some("raw"));
        assert_eq!(Value::Integer(1).as_text(), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Integer(5).type_name(), "INTEGER");
        assert_eq!(Value::Boolean(true).type_name(), "BOOLEAN");
        assert_eq!(
            Value::Recur(RecurRule::default()).type_name(),
            "RECUR"
        );
    }
}
