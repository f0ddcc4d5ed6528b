//! Execution errors

use thiserror::Error;
use wgsl_parser::ParseError;
use wgsl_reflect::ReflectError;

/// Execution result type
pub type Result<T> = std::result::Result<T, ExecError>;

/// What went wrong, independent of where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source failed to parse or its types failed to resolve.
    Parse,
    /// Undeclared variable, function or resource.
    Binding,
    /// Operator or builtin applied to an incompatible value.
    Type,
    /// Array or texture access outside its bounds.
    Bounds,
    /// Builtin or feature the engine does not emulate.
    Unimplemented,
    /// Engine invariant broken; indicates a bug rather than a shader error.
    Internal,
}

/// Error raised while evaluating a shader.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?} error at line {line}: {message}")]
pub struct ExecError {
    pub kind: ErrorKind,
    /// 1-based source line, 0 until the failing command attaches one.
    pub line: u32,
    pub message: String,
}

impl ExecError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: 0,
            message: message.into(),
        }
    }

    pub fn binding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Binding, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn bounds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Bounds, message)
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unimplemented, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach a source line unless one is already set.
    pub fn at(mut self, line: u32) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        self
    }
}

impl From<ParseError> for ExecError {
    fn from(err: ParseError) -> Self {
        Self {
            kind: ErrorKind::Parse,
            line: err.line(),
            message: err.message,
        }
    }
}

impl From<ReflectError> for ExecError {
    fn from(err: ReflectError) -> Self {
        Self {
            kind: ErrorKind::Parse,
            line: err.line(),
            message: err.to_string(),
        }
    }
}
