//! Statement and block parsers.

use super::decl::skip_attributes;
use super::expr::{parse_expr, parse_unary_expr};
use super::token_utils::compound_op;
use super::types::{parse_template_list, parse_type_expr};
use super::{ParseError, TokenStream};
use wgsl_ast::{
    Block, CaseSelector, Continuing, ExprKind, LocalDecl, LocalKind, Stmt, StmtKind, SwitchCase,
};
use wgsl_lexer::Token;

/// Parse `{ stmt* }`.
pub fn parse_block(stream: &mut TokenStream) -> Result<Block, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut stmts = Vec::new();
    while !stream.check(&Token::RBrace) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "in block",
                stream.current_span(),
            ));
        }
        if let Some(stmt) = parse_stmt(stream)? {
            stmts.push(stmt);
        }
    }
    stream.expect(Token::RBrace)?;
    Ok(stmts)
}

/// Parse one statement. Empty statements (`;`) yield `None`.
pub fn parse_stmt(stream: &mut TokenStream) -> Result<Option<Stmt>, ParseError> {
    skip_attributes(stream)?;
    let start = stream.current_pos();

    let kind = match stream.peek() {
        Some(Token::Semicolon) => {
            stream.advance();
            return Ok(None);
        }
        Some(Token::LBrace) => StmtKind::Block(parse_block(stream)?),
        Some(Token::If) => parse_if(stream)?,
        Some(Token::Switch) => parse_switch(stream)?,
        Some(Token::For) => parse_for(stream)?,
        Some(Token::While) => {
            stream.advance();
            let condition = parse_expr(stream)?;
            let body = parse_block(stream)?;
            StmtKind::While { condition, body }
        }
        Some(Token::Loop) => parse_loop(stream)?,
        Some(Token::Break) => {
            stream.advance();
            if stream.eat(&Token::If) {
                let condition = parse_expr(stream)?;
                stream.expect(Token::Semicolon)?;
                StmtKind::BreakIf(condition)
            } else {
                stream.expect(Token::Semicolon)?;
                StmtKind::Break
            }
        }
        Some(Token::Continue) => {
            stream.advance();
            stream.expect(Token::Semicolon)?;
            StmtKind::Continue
        }
        Some(Token::Return) => {
            stream.advance();
            let value = if stream.check(&Token::Semicolon) {
                None
            } else {
                Some(parse_expr(stream)?)
            };
            stream.expect(Token::Semicolon)?;
            StmtKind::Return(value)
        }
        Some(Token::Discard) => {
            stream.advance();
            stream.expect(Token::Semicolon)?;
            StmtKind::Discard
        }
        Some(Token::ConstAssert) => {
            stream.advance();
            let expr = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            StmtKind::ConstAssert(expr)
        }
        _ => {
            let kind = parse_simple_stmt(stream)?;
            stream.expect(Token::Semicolon)?;
            kind
        }
    };

    Ok(Some(Stmt {
        kind,
        span: stream.span_from(start),
    }))
}

/// Statements allowed in `for` headers: declarations, assignments,
/// increments and calls. No trailing semicolon.
fn parse_simple_stmt(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    match stream.peek() {
        Some(Token::Var) | Some(Token::Let) | Some(Token::Const) => {
            Ok(StmtKind::Decl(parse_local_decl(stream)?))
        }
        Some(Token::Underscore) => {
            stream.advance();
            stream.expect(Token::Eq)?;
            Ok(StmtKind::Phony(parse_expr(stream)?))
        }
        _ => {
            let target = parse_unary_expr(stream)?;
            let span = stream.current_span();
            match stream.peek() {
                Some(Token::Eq) => {
                    stream.advance();
                    let value = parse_expr(stream)?;
                    Ok(StmtKind::Assign {
                        target,
                        op: None,
                        value,
                    })
                }
                Some(Token::PlusPlus) => {
                    stream.advance();
                    Ok(StmtKind::Increment(target))
                }
                Some(Token::MinusMinus) => {
                    stream.advance();
                    Ok(StmtKind::Decrement(target))
                }
                Some(token) if compound_op(token).is_some() => {
                    let op = compound_op(token);
                    stream.advance();
                    let value = parse_expr(stream)?;
                    Ok(StmtKind::Assign { target, op, value })
                }
                _ if matches!(target.kind, ExprKind::Call { .. }) => Ok(StmtKind::Call(target)),
                other => Err(ParseError::unexpected_token(other, "in statement", span)),
            }
        }
    }
}

fn parse_local_decl(stream: &mut TokenStream) -> Result<LocalDecl, ParseError> {
    let kind = match stream.advance() {
        Some(Token::Var) => {
            // `var<function>` is the only space a local may name.
            if stream.check(&Token::Lt) {
                parse_template_list(stream)?;
            }
            LocalKind::Var
        }
        Some(Token::Let) => LocalKind::Let,
        _ => LocalKind::Const,
    };
    let name = stream.expect_ident("as variable name")?;
    let ty = if stream.eat(&Token::Colon) {
        Some(parse_type_expr(stream)?)
    } else {
        None
    };
    let init = if stream.eat(&Token::Eq) {
        Some(parse_expr(stream)?)
    } else {
        None
    };
    if init.is_none() && kind != LocalKind::Var {
        return Err(ParseError::invalid_syntax(
            format!("'{name}' must be initialized"),
            stream.current_span(),
        ));
    }
    Ok(LocalDecl {
        kind,
        name,
        ty,
        init,
    })
}

fn parse_if(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.expect(Token::If)?;
    let condition = parse_expr(stream)?;
    let body = parse_block(stream)?;
    let mut else_ifs = Vec::new();
    let mut else_body = None;

    while stream.eat(&Token::Else) {
        if stream.eat(&Token::If) {
            let cond = parse_expr(stream)?;
            let block = parse_block(stream)?;
            else_ifs.push((cond, block));
        } else {
            else_body = Some(parse_block(stream)?);
            break;
        }
    }

    Ok(StmtKind::If {
        condition,
        body,
        else_ifs,
        else_body,
    })
}

fn parse_switch(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.expect(Token::Switch)?;
    let selector = parse_expr(stream)?;
    skip_attributes(stream)?;
    stream.expect(Token::LBrace)?;

    let mut cases = Vec::new();
    while !stream.eat(&Token::RBrace) {
        let start = stream.current_pos();
        let selectors = match stream.advance() {
            Some(Token::Default) => vec![CaseSelector::Default],
            Some(Token::Case) => parse_case_selectors(stream)?,
            other => {
                return Err(ParseError::unexpected_token(
                    other.as_ref(),
                    "in switch body",
                    stream.span_from(start),
                ))
            }
        };
        stream.eat(&Token::Colon);
        let body = parse_block(stream)?;
        cases.push(SwitchCase {
            selectors,
            body,
            span: stream.span_from(start),
        });
    }

    Ok(StmtKind::Switch { selector, cases })
}

fn parse_case_selectors(stream: &mut TokenStream) -> Result<Vec<CaseSelector>, ParseError> {
    let mut selectors = Vec::new();
    loop {
        if stream.eat(&Token::Default) {
            selectors.push(CaseSelector::Default);
        } else {
            selectors.push(CaseSelector::Expr(parse_expr(stream)?));
        }
        if !stream.eat(&Token::Comma) || stream.check(&Token::Colon) || stream.check(&Token::LBrace)
        {
            break;
        }
    }
    Ok(selectors)
}

fn parse_for(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.expect(Token::For)?;
    stream.expect(Token::LParen)?;

    let init = if stream.check(&Token::Semicolon) {
        None
    } else {
        let start = stream.current_pos();
        let kind = parse_simple_stmt(stream)?;
        Some(Box::new(Stmt {
            kind,
            span: stream.span_from(start),
        }))
    };
    stream.expect(Token::Semicolon)?;

    let condition = if stream.check(&Token::Semicolon) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::Semicolon)?;

    let update = if stream.check(&Token::RParen) {
        None
    } else {
        let start = stream.current_pos();
        let kind = parse_simple_stmt(stream)?;
        Some(Box::new(Stmt {
            kind,
            span: stream.span_from(start),
        }))
    };
    stream.expect(Token::RParen)?;

    let body = parse_block(stream)?;
    Ok(StmtKind::For {
        init,
        condition,
        update,
        body,
    })
}

fn parse_loop(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.expect(Token::Loop)?;
    skip_attributes(stream)?;
    stream.expect(Token::LBrace)?;

    let mut body = Vec::new();
    let mut continuing = None;
    while !stream.eat(&Token::RBrace) {
        if stream.check(&Token::Continuing) {
            continuing = Some(parse_continuing(stream)?);
            stream.expect(Token::RBrace).map_err(|_| {
                ParseError::invalid_syntax(
                    "continuing must be the last statement of a loop",
                    stream.current_span(),
                )
            })?;
            break;
        }
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "in loop body",
                stream.current_span(),
            ));
        }
        if let Some(stmt) = parse_stmt(stream)? {
            body.push(stmt);
        }
    }

    Ok(StmtKind::Loop { body, continuing })
}

fn parse_continuing(stream: &mut TokenStream) -> Result<Continuing, ParseError> {
    stream.expect(Token::Continuing)?;
    stream.expect(Token::LBrace)?;

    let mut body = Vec::new();
    let mut break_if = None;
    while !stream.eat(&Token::RBrace) {
        if stream.check(&Token::Break) && stream.peek_nth(1) == Some(&Token::If) {
            stream.advance();
            stream.advance();
            break_if = Some(parse_expr(stream)?);
            stream.expect(Token::Semicolon)?;
            stream.expect(Token::RBrace)?;
            break;
        }
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "in continuing block",
                stream.current_span(),
            ));
        }
        if let Some(stmt) = parse_stmt(stream)? {
            body.push(stmt);
        }
    }

    Ok(Continuing { body, break_if })
}
