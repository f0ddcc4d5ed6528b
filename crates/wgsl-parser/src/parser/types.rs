//! Type expression and template list parsers.

use super::{expr, ParseError, TokenStream};
use wgsl_ast::{TemplateArg, TypeExpr};
use wgsl_lexer::Token;

/// Parse a type expression (`f32`, `vec3<f32>`, `array<Light, 4>`).
pub fn parse_type_expr(stream: &mut TokenStream) -> Result<TypeExpr, ParseError> {
    let start = stream.current_pos();
    let name = stream.expect_ident("in type expression")?;
    let args = if stream.check(&Token::Lt) {
        parse_template_list(stream)?
    } else {
        Vec::new()
    };
    Ok(TypeExpr {
        name,
        args,
        span: stream.span_from(start),
    })
}

/// Parse `<arg, arg, ...>`, the opening `<` is the current token.
pub fn parse_template_list(stream: &mut TokenStream) -> Result<Vec<TemplateArg>, ParseError> {
    stream.expect(Token::Lt)?;
    let mut args = Vec::new();
    loop {
        if matches!(
            stream.peek(),
            Some(Token::Gt | Token::ShiftRight | Token::GtEq | Token::ShiftRightEq)
        ) {
            break;
        }
        args.push(parse_template_arg(stream)?);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect_template_close()?;
    Ok(args)
}

fn parse_template_arg(stream: &mut TokenStream) -> Result<TemplateArg, ParseError> {
    // An identifier followed by a list terminator or its own template list
    // is a type (or an enumerant such as `read_write`).
    if let Some(Token::Ident(_)) = stream.peek() {
        let next = stream.peek_nth(1);
        let is_type = match next {
            Some(Token::Comma | Token::Gt | Token::ShiftRight | Token::GtEq | Token::ShiftRightEq) => {
                true
            }
            Some(Token::Lt) => match stream.peek() {
                Some(Token::Ident(name)) => super::token_utils::is_template_name(name),
                _ => false,
            },
            _ => false,
        };
        if is_type {
            return Ok(TemplateArg::Type(parse_type_expr(stream)?));
        }
    }

    let saved = stream.in_template;
    stream.in_template = true;
    let result = expr::parse_expr(stream);
    stream.in_template = saved;
    Ok(TemplateArg::Expr(result?))
}
