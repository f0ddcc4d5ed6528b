//! Pratt parser core - precedence climbing for binary and unary operators.

use super::super::{ParseError, TokenStream};
use super::atoms;
use wgsl_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use wgsl_lexer::Token;

/// Get binary operator metadata (precedence and operator enum).
///
/// Higher precedence binds tighter. Everything is left associative.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::OrOr => Some((10, BinaryOp::LogicalOr)),
        Token::AndAnd => Some((20, BinaryOp::LogicalAnd)),
        Token::Pipe => Some((30, BinaryOp::BitOr)),
        Token::Caret => Some((40, BinaryOp::BitXor)),
        Token::Amp => Some((50, BinaryOp::BitAnd)),
        Token::EqEq => Some((60, BinaryOp::Eq)),
        Token::BangEq => Some((60, BinaryOp::Ne)),
        Token::Lt => Some((70, BinaryOp::Lt)),
        Token::LtEq => Some((70, BinaryOp::Le)),
        Token::Gt => Some((70, BinaryOp::Gt)),
        Token::GtEq => Some((70, BinaryOp::Ge)),
        Token::ShiftLeft => Some((80, BinaryOp::Shl)),
        Token::ShiftRight => Some((80, BinaryOp::Shr)),
        Token::Plus => Some((90, BinaryOp::Add)),
        Token::Minus => Some((90, BinaryOp::Sub)),
        Token::Star => Some((100, BinaryOp::Mul)),
        Token::Slash => Some((100, BinaryOp::Div)),
        Token::Percent => Some((100, BinaryOp::Rem)),
        _ => None,
    }
}

/// Pratt parser - handles binary operators with precedence climbing.
pub(super) fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        // Inside `<...>` a `>` ends the template list.
        if stream.in_template && matches!(token, Token::Gt | Token::GtEq | Token::ShiftRight) {
            break;
        }
        let Some((prec, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();

        let right = parse_pratt(stream, prec + 1)?;
        let span = stream.span_from(start);
        left = stream.expr(
            ExprKind::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            },
            span,
        );
    }

    Ok(left)
}

/// Parse prefix expressions (unary operators, then postfix chains).
pub(super) fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus | Token::Bang | Token::Tilde | Token::Star | Token::Amp) => {
            parse_unary(stream)
        }
        // `&&x` lexes as one token; it is two address-of operators.
        Some(Token::AndAnd) => Err(ParseError::invalid_syntax(
            "'&&' is not a prefix operator, write '&(&x)'",
            stream.current_span(),
        )),
        _ => parse_postfix(stream),
    }
}

/// Parse unary operators.
fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();
    let op = match stream.advance() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Bang) => UnaryOp::Not,
        Some(Token::Tilde) => UnaryOp::BitNot,
        Some(Token::Star) => UnaryOp::Deref,
        Some(Token::Amp) => UnaryOp::AddressOf,
        other => {
            return Err(ParseError::unexpected_token(
                other.as_ref(),
                "as unary operator",
                span,
            ));
        }
    };

    let operand = parse_prefix(stream)?;
    let span = stream.span_from(start);
    Ok(stream.expr(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}

/// Parse postfix expressions (member access, indexing).
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut expr = atoms::parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let span = stream.current_span();
                let member = match stream.advance() {
                    Some(token) => super::super::token_utils::name_text(&token).ok_or_else(
                        || ParseError::unexpected_token(Some(&token), "after '.'", span),
                    )?,
                    None => return Err(ParseError::unexpected_token(None, "after '.'", span)),
                };
                let span = stream.span_from(start);
                expr = stream.expr(
                    ExprKind::Member {
                        base: Box::new(expr),
                        member,
                    },
                    span,
                );
            }
            Some(Token::LBracket) => {
                stream.advance();
                let saved = stream.in_template;
                stream.in_template = false;
                let index = super::parse_expr(stream);
                stream.in_template = saved;
                let index = index?;
                stream.expect(Token::RBracket)?;
                let span = stream.span_from(start);
                expr = stream.expr(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            }
            _ => break,
        }
    }

    Ok(expr)
}
