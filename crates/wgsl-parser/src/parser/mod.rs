//! Hand-written recursive descent parser for WGSL.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead and template splitting
//! - `error`: ParseError
//! - `expr`: Expression parser using Pratt parsing
//! - `blocks`: Statement and block parsers
//! - `decl`: Module-scope declarations and attributes
//! - `types`: Type expressions and template lists
//!
//! ## Public API
//!
//! ```rust,ignore
//! pub fn parse_module(source: &str) -> Result<Module, ParseError>
//! pub fn parse_expr(source: &str) -> Result<Expr, ParseError>
//! ```

mod error;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

mod blocks;
mod decl;
mod expr;
pub mod token_utils;
mod types;

use wgsl_ast::{Expr, Module};
use wgsl_lexer::lex;

/// Parse a complete shader module.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    let tokens = lex(source)?;
    let mut stream = TokenStream::new(tokens, source);
    let mut items = Vec::new();
    while !stream.at_end() {
        if let Some(item) = decl::parse_item(&mut stream)? {
            items.push(item);
        }
    }
    Ok(Module { items })
}

/// Parse a single expression. Trailing tokens are an error.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let tokens = lex(source)?;
    let mut stream = TokenStream::new(tokens, source);
    let expr = expr::parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after expression",
            stream.current_span(),
        ));
    }
    Ok(expr)
}
