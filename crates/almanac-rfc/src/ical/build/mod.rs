//! iCalendar serialization (RFC 5545).
//!
//! Escaping, 75-octet folding, and document serialization with canonical
//! property ordering so equal calendars always produce equal bytes.

mod escape;
mod fold;
mod serializer;

pub use escape::{escape_param_value, escape_text};
pub use fold::fold_line;
pub use serializer::{serialize, serialize_component, serialize_property};
