//! Module-scope declaration parsers (keyword-dispatched).

use super::blocks::parse_block;
use super::expr::{parse_call_args, parse_expr};
use super::token_utils::name_text;
use super::types::{parse_template_list, parse_type_expr};
use super::{ParseError, TokenStream};
use wgsl_ast::{
    AliasDecl, Attribute, ConstDecl, Directive, FunctionDecl, GlobalVar, Item, OverrideDecl,
    Param, StructDecl, StructMember,
};
use wgsl_lexer::Token;

/// Parse one module-scope item. Stray semicolons yield `None`.
pub fn parse_item(stream: &mut TokenStream) -> Result<Option<Item>, ParseError> {
    let start = stream.current_pos();
    let attributes = parse_attributes(stream)?;

    let item = match stream.peek() {
        Some(Token::Semicolon) => {
            stream.advance();
            return Ok(None);
        }
        Some(Token::Enable) | Some(Token::Requires) => parse_directive(stream)?,
        Some(Token::Diagnostic) => {
            stream.advance();
            parse_call_args(stream)?;
            stream.expect(Token::Semicolon)?;
            Item::Directive(Directive::Diagnostic)
        }
        Some(Token::Fn) => Item::Function(parse_function(stream, attributes, start)?),
        Some(Token::Var) => Item::Var(parse_global_var(stream, attributes, start)?),
        Some(Token::Override) => Item::Override(parse_override(stream, attributes, start)?),
        Some(Token::Const) | Some(Token::Let) => {
            let is_const = matches!(stream.advance(), Some(Token::Const));
            let name = stream.expect_ident("as constant name")?;
            let ty = if stream.eat(&Token::Colon) {
                Some(parse_type_expr(stream)?)
            } else {
                None
            };
            stream.expect(Token::Eq)?;
            let init = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            let decl = ConstDecl {
                name,
                ty,
                init,
                span: stream.span_from(start),
            };
            if is_const {
                Item::Const(decl)
            } else {
                Item::Let(decl)
            }
        }
        Some(Token::Struct) => Item::Struct(parse_struct(stream, start)?),
        Some(Token::Alias) => {
            stream.advance();
            let name = stream.expect_ident("as alias name")?;
            stream.expect(Token::Eq)?;
            let ty = parse_type_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            Item::Alias(AliasDecl {
                name,
                ty,
                span: stream.span_from(start),
            })
        }
        Some(Token::ConstAssert) => {
            stream.advance();
            let expr = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            Item::ConstAssert(expr)
        }
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "at module scope",
                stream.current_span(),
            ))
        }
    };
    Ok(Some(item))
}

fn parse_directive(stream: &mut TokenStream) -> Result<Item, ParseError> {
    let is_enable = matches!(stream.advance(), Some(Token::Enable));
    let mut names = Vec::new();
    loop {
        names.push(stream.expect_ident("in directive")?);
        if !stream.eat(&Token::Comma) || stream.check(&Token::Semicolon) {
            break;
        }
    }
    stream.expect(Token::Semicolon)?;
    Ok(Item::Directive(if is_enable {
        Directive::Enable(names)
    } else {
        Directive::Requires(names)
    }))
}

/// Parse zero or more `@name` / `@name(args)` attributes.
pub fn parse_attributes(stream: &mut TokenStream) -> Result<Vec<Attribute>, ParseError> {
    let mut attributes = Vec::new();
    while stream.check(&Token::At) {
        let start = stream.current_pos();
        stream.advance();
        let span = stream.current_span();
        let name = match stream.advance() {
            Some(token) => name_text(&token)
                .ok_or_else(|| ParseError::unexpected_token(Some(&token), "after '@'", span))?,
            None => return Err(ParseError::unexpected_token(None, "after '@'", span)),
        };
        let args = if stream.check(&Token::LParen) {
            parse_call_args(stream)?
        } else {
            Vec::new()
        };
        attributes.push(Attribute {
            name,
            args,
            span: stream.span_from(start),
        });
    }
    Ok(attributes)
}

/// Statement-level attributes carry nothing the interpreter uses.
pub fn skip_attributes(stream: &mut TokenStream) -> Result<(), ParseError> {
    parse_attributes(stream).map(|_| ())
}

fn parse_function(
    stream: &mut TokenStream,
    attributes: Vec<Attribute>,
    start: usize,
) -> Result<FunctionDecl, ParseError> {
    stream.expect(Token::Fn)?;
    let name = stream.expect_ident("as function name")?;
    stream.expect(Token::LParen)?;

    let mut params = Vec::new();
    while !stream.check(&Token::RParen) {
        let param_start = stream.current_pos();
        let param_attributes = parse_attributes(stream)?;
        let param_name = stream.expect_ident("as parameter name")?;
        stream.expect(Token::Colon)?;
        let ty = parse_type_expr(stream)?;
        params.push(Param {
            attributes: param_attributes,
            name: param_name,
            ty,
            span: stream.span_from(param_start),
        });
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RParen)?;

    let (return_type, return_attributes) = if stream.eat(&Token::Arrow) {
        let attrs = parse_attributes(stream)?;
        (Some(parse_type_expr(stream)?), attrs)
    } else {
        (None, Vec::new())
    };

    let body = parse_block(stream)?;
    Ok(FunctionDecl {
        attributes,
        name,
        params,
        return_type,
        return_attributes,
        body,
        span: stream.span_from(start),
    })
}

fn parse_global_var(
    stream: &mut TokenStream,
    attributes: Vec<Attribute>,
    start: usize,
) -> Result<GlobalVar, ParseError> {
    stream.expect(Token::Var)?;
    let (address_space, access) = if stream.check(&Token::Lt) {
        let args = parse_template_list(stream)?;
        (
            args.first().and_then(|a| a.as_name()).map(str::to_string),
            args.get(1).and_then(|a| a.as_name()).map(str::to_string),
        )
    } else {
        (None, None)
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
    stream.expect(Token::Semicolon)?;
    Ok(GlobalVar {
        attributes,
        name,
        address_space,
        access,
        ty,
        init,
        span: stream.span_from(start),
    })
}

fn parse_override(
    stream: &mut TokenStream,
    attributes: Vec<Attribute>,
    start: usize,
) -> Result<OverrideDecl, ParseError> {
    stream.expect(Token::Override)?;
    let name = stream.expect_ident("as override name")?;
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
    stream.expect(Token::Semicolon)?;
    Ok(OverrideDecl {
        attributes,
        name,
        ty,
        init,
        span: stream.span_from(start),
    })
}

fn parse_struct(stream: &mut TokenStream, start: usize) -> Result<StructDecl, ParseError> {
    stream.expect(Token::Struct)?;
    let name = stream.expect_ident("as struct name")?;
    stream.expect(Token::LBrace)?;

    let mut members = Vec::new();
    while !stream.check(&Token::RBrace) {
        let member_start = stream.current_pos();
        let attributes = parse_attributes(stream)?;
        let member_name = stream.expect_ident("as struct member name")?;
        stream.expect(Token::Colon)?;
        let ty = parse_type_expr(stream)?;
        members.push(StructMember {
            attributes,
            name: member_name,
            ty,
            span: stream.span_from(member_start),
        });
        if !stream.eat(&Token::Comma) && !stream.eat(&Token::Semicolon) {
            break;
        }
    }
    stream.expect(Token::RBrace)?;
    stream.eat(&Token::Semicolon);

    Ok(StructDecl {
        name,
        members,
        span: stream.span_from(start),
    })
}
