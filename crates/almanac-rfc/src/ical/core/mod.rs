//! Core iCalendar types shared by the parser and the serializer.

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod recur;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{IcalDateTime, TimeForm, format_utc};
pub use duration::IcalDuration;
pub use parameter::Parameter;
pub use property::{ContentLine, Property};
pub use recur::{OrdWeekday, RecurFreq, RecurRule, RecurUntil, RuleWeekday};
pub use value::Value;
