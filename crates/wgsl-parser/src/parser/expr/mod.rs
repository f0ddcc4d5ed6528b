//! Expression parser using Pratt parsing (precedence climbing).
//!
//! ## Precedence Levels (lowest to highest)
//!
//! 1. `||`
//! 2. `&&`
//! 3. `|`
//! 4. `^`
//! 5. `&`
//! 6. `==`, `!=`
//! 7. `<`, `<=`, `>`, `>=`
//! 8. `<<`, `>>`
//! 9. `+`, `-`
//! 10. `*`, `/`, `%`
//! 11. Unary `-`, `!`, `~`, `*`, `&` - prefix
//! 12. Postfix: `.member`, `[index]`
//!
//! All binary operators are left associative.

mod atoms;
mod pratt;

use super::{ParseError, TokenStream};
use wgsl_ast::Expr;

/// Parse an expression.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    pratt::parse_pratt(stream, 0)
}

/// Parse a unary/postfix expression without binary operators.
///
/// Used for assignment targets, where `a = b` must not swallow `=`.
pub fn parse_unary_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    pratt::parse_prefix(stream)
}

pub(crate) use atoms::parse_call_args;
