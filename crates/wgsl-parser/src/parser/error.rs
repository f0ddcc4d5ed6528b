//! Parse error types.

use std::fmt;
use wgsl_ast::Span;
use wgsl_lexer::{LexError, Token};

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Source location where error occurred
    pub span: Span,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Source contains a character no token starts with.
    InvalidToken,

    /// Unexpected token encountered where a specific token was expected.
    ///
    /// Example: expected `;` after a declaration, found identifier instead.
    UnexpectedToken,

    /// Unexpected end of input while parsing was incomplete.
    ///
    /// Example: reached EOF while parsing function body, missing `}`.
    UnexpectedEof,

    /// Tokens are present but violate grammar rules, such as a
    /// `continuing` block that is not the last statement of a loop.
    InvalidSyntax,

    /// Other parse error not covered by specific categories.
    Other,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: Token, found: Option<Token>, span: Span) -> Self {
        let message = match &found {
            Some(token) => format!("expected '{}', found '{}'", expected, token),
            None => format!("expected '{}', found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected '{}' {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }

    /// Create a generic parse error.
    pub fn other(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Other,
            span,
            message: message.into(),
        }
    }

    /// 1-based source line of the error.
    pub fn line(&self) -> u32 {
        self.span.line
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        let (offset, line) = match &err {
            LexError::UnexpectedCharacter { offset, line, .. } => (*offset as u32, *line),
        };
        Self {
            kind: ParseErrorKind::InvalidToken,
            span: Span::new(offset, offset + 1, line),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.message, self.span.line)
    }
}

impl std::error::Error for ParseError {}
