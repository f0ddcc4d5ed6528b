//! Reflection errors

use thiserror::Error;
use wgsl_parser::ParseError;

/// Reflection result type
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Reflection errors
#[derive(Debug, Clone, Error)]
pub enum ReflectError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown type '{name}' at line {line}")]
    UnknownType { name: String, line: u32 },

    #[error("invalid type '{name}' at line {line}: {reason}")]
    InvalidType {
        name: String,
        reason: String,
        line: u32,
    },

    #[error("struct '{0}' contains itself")]
    RecursiveStruct(String),

    #[error("expression at line {line} is not a constant integer: {reason}")]
    NotConstant { reason: String, line: u32 },
}

impl ReflectError {
    /// 1-based source line, 0 when not tied to a location.
    pub fn line(&self) -> u32 {
        match self {
            ReflectError::Parse(err) => err.line(),
            ReflectError::UnknownType { line, .. }
            | ReflectError::InvalidType { line, .. }
            | ReflectError::NotConstant { line, .. } => *line,
            ReflectError::RecursiveStruct(_) => 0,
        }
    }
}
