//! iCalendar properties and content lines (RFC 5545 §3.1, §3.8).

use super::{IcalDateTime, Parameter, Value};

/// A raw content line before value typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string, unfolded but not unescaped.
    pub raw_value: String,
}

impl ContentLine {
    /// Creates a content line without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            raw_value: value.into(),
        }
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let upper = name.to_ascii_uppercase();
        self.params.iter().find(|p| p.name == upper)
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Returns the `VALUE=` parameter if present.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.get_param_value("VALUE")
    }

    /// Returns the `TZID=` parameter if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value("TZID")
    }
}

/// A property with a typed value.
///
/// `raw_value` preserves the text as written so untouched properties can be
/// re-serialized without drift.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Parsed value.
    pub value: Value,
    /// Raw value string.
    pub raw_value: String,
}

impl Property {
    /// Creates a text property.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Text(value.clone()),
            raw_value: value,
        }
    }

    /// Creates an integer property.
    #[must_use]
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::Integer(value),
            raw_value: value.to_string(),
        }
    }

    /// Creates a date-time property.
    #[must_use]
    pub fn datetime(name: impl Into<String>, dt: IcalDateTime) -> Self {
        let raw = dt.to_string();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: Value::DateTime(dt),
            raw_value: raw,
        }
    }

    /// Creates a property carrying an arbitrary typed value.
    #[must_use]
    pub fn with_value(name: impl Into<String>, value: Value, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value,
            raw_value: raw_value.into(),
        }
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let upper = name.to_ascii_uppercase();
        self.params.iter().find(|p| p.name == upper)
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Adds a parameter.
    pub fn add_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    /// Sets a parameter, replacing any existing one with the same name.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    /// Removes a parameter by name.
    pub fn remove_param(&mut self, name: &str) {
        let upper = name.to_ascii_uppercase();
        self.params.retain(|p| p.name != upper);
    }

    /// Returns the value as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    /// Returns the value as an integer.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        self.value.as_integer()
    }

    /// Returns the value as a date-time.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&IcalDateTime> {
        self.value.as_datetime()
    }
}
