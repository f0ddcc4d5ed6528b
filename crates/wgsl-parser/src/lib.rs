//! Hand-written recursive descent parser for WGSL
//!
//! Turns shader source into a [`wgsl_ast::Module`]. Expression ids are
//! assigned in parse order, spans carry 1-based source lines.
//!
//! ```
//! let module = wgsl_parser::parse_module("const N = 4u;").unwrap();
//! assert_eq!(module.items.len(), 1);
//! ```

pub mod parser;

pub use parser::{parse_expr, parse_module, ParseError, ParseErrorKind};

// Re-export lexer
pub use wgsl_lexer::Token;
