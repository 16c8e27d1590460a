//! Parse error types for iCalendar input.

use thiserror::Error;

/// What went wrong while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingBegin,
    MissingEnd,
    MismatchedComponent,
    MissingPropertyName,
    InvalidPropertyName,
    MissingColon,
    InvalidParameter,
    UnclosedQuote,
    InvalidValue,
}

impl ParseErrorKind {
    /// Short description of the error kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingBegin => "missing BEGIN line",
            Self::MissingEnd => "missing END line",
            Self::MismatchedComponent => "mismatched BEGIN/END component",
            Self::MissingPropertyName => "missing property name",
            Self::InvalidPropertyName => "invalid property name",
            Self::MissingColon => "missing ':' separator",
            Self::InvalidParameter => "invalid parameter",
            Self::UnclosedQuote => "unclosed quoted parameter value",
            Self::InvalidValue => "invalid property value",
        }
    }
}

/// A parse error with position information.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} at line {line}, column {column}{}", kind.as_str(), context.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a parse error at the given position.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    /// Attaches free-form context to the error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let err = ParseError::new(ParseErrorKind::MissingColon, 4, 12);
        assert_eq!(err.to_string(), "missing ':' separator at line 4, column 12");
    }

    #[test]
    fn display_includes_context() {
        let err = ParseError::new(ParseErrorKind::MismatchedComponent, 9, 1)
            .with_context("expected END:VEVENT");
        assert!(err.to_string().ends_with("expected END:VEVENT"));
    }
}
