//! vCard (RFC 6350) model, parser, and serializer.
//!
//! The address-book path only persists scalar fields, so this module is a
//! flat property bag without the component nesting iCalendar needs.

pub mod build;
pub mod core;
pub mod parse;
