//! Atomic expressions - literals, identifiers, calls, parenthesized expressions.

use super::super::token_utils::is_template_name;
use super::super::types::parse_template_list;
use super::super::{ParseError, TokenStream};
use wgsl_ast::{Expr, ExprKind, Literal};
use wgsl_lexer::{FloatLiteral, IntLiteral, NumSuffix, Token};

/// Parse atomic expressions.
pub(super) fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();

    match stream.peek() {
        Some(Token::True) => {
            stream.advance();
            let span = stream.span_from(start);
            Ok(stream.expr(ExprKind::Literal(Literal::Bool(true)), span))
        }
        Some(Token::False) => {
            stream.advance();
            let span = stream.span_from(start);
            Ok(stream.expr(ExprKind::Literal(Literal::Bool(false)), span))
        }
        Some(Token::Int(lit)) => {
            let lit = *lit;
            let span = stream.current_span();
            stream.advance();
            let literal = int_literal(lit).ok_or_else(|| {
                ParseError::invalid_syntax(
                    format!("integer literal {} does not fit its type", lit.value),
                    span,
                )
            })?;
            Ok(stream.expr(ExprKind::Literal(literal), span))
        }
        Some(Token::Float(lit)) => {
            let literal = float_literal(*lit);
            stream.advance();
            let span = stream.span_from(start);
            Ok(stream.expr(ExprKind::Literal(literal), span))
        }
        Some(Token::LParen) => parse_parenthesized(stream),
        Some(Token::Ident(_)) => parse_identifier(stream),
        other => Err(ParseError::unexpected_token(
            other,
            "in expression",
            stream.current_span(),
        )),
    }
}

fn int_literal(lit: IntLiteral) -> Option<Literal> {
    match lit.suffix {
        None => Some(Literal::AbstractInt(lit.value)),
        // `2147483648i` only appears negated; let it wrap to i32::MIN
        Some(NumSuffix::I) if lit.value <= u32::MAX as i64 => Some(Literal::I32(lit.value as i32)),
        Some(NumSuffix::U) if lit.value <= u32::MAX as i64 => Some(Literal::U32(lit.value as u32)),
        Some(NumSuffix::F) => Some(Literal::F32(lit.value as f32)),
        Some(NumSuffix::H) => Some(Literal::F16(lit.value as f32)),
        _ => None,
    }
}

fn float_literal(lit: FloatLiteral) -> Literal {
    match lit.suffix {
        Some(NumSuffix::F) => Literal::F32(lit.value as f32),
        Some(NumSuffix::H) => Literal::F16(lit.value as f32),
        _ => Literal::AbstractFloat(lit.value),
    }
}

fn parse_parenthesized(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    stream.expect(Token::LParen)?;
    let saved = stream.in_template;
    stream.in_template = false;
    let inner = super::parse_expr(stream);
    stream.in_template = saved;
    let inner = inner?;
    stream.expect(Token::RParen)?;
    Ok(inner)
}

/// Identifier, optionally followed by a template list and/or call arguments.
fn parse_identifier(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let name = stream.expect_ident("in expression")?;

    let template = if stream.check(&Token::Lt) && is_template_name(&name) {
        parse_template_list(stream)?
    } else {
        Vec::new()
    };

    if stream.check(&Token::LParen) {
        let args = parse_call_args(stream)?;
        let span = stream.span_from(start);
        return Ok(stream.expr(
            ExprKind::Call {
                callee: name,
                template,
                args,
            },
            span,
        ));
    }

    if !template.is_empty() {
        return Err(ParseError::invalid_syntax(
            format!("type '{name}' used as a value"),
            stream.span_from(start),
        ));
    }

    let span = stream.span_from(start);
    Ok(stream.expr(ExprKind::Ident(name), span))
}

/// Parse `( expr, expr, ... )` with an optional trailing comma.
pub(crate) fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let saved = stream.in_template;
    stream.in_template = false;
    let result = parse_arg_list(stream);
    stream.in_template = saved;
    result
}

fn parse_arg_list(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    let mut args = Vec::new();
    while !stream.check(&Token::RParen) {
        args.push(super::parse_expr(stream)?);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RParen)?;
    Ok(args)
}
