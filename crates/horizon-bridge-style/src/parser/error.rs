//! Selector parsing errors.

use cssparser::{BasicParseErrorKind, ParseErrorKind};

/// Selector parse error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error message describing what went wrong.
    pub message: String,
    /// Line number where the error occurred (1-indexed).
    pub line: u32,
    /// Column number where the error occurred (1-indexed).
    pub column: u32,
}

impl ParseError {
    /// Create a new parse error with the given message and location.
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    /// Convert a `cssparser` error whose custom payload is a message.
    pub(crate) fn from_css(error: cssparser::ParseError<'_, String>) -> Self {
        let message = match error.kind {
            ParseErrorKind::Custom(message) => message,
            ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
                "unexpected end of selector".to_string()
            }
            ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
                format!("unexpected token {token:?}")
            }
            ParseErrorKind::Basic(kind) => format!("{kind:?}"),
        };
        Self::new(message, error.location.line + 1, error.location.column)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "selector parse error at {}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}
