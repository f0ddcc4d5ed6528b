//! Token classification helpers.
//!
//! WGSL template lists (`vec3<f32>`) share `<` with less-than. A `<` directly
//! after one of the predeclared generic names opens a template list, anywhere
//! else it is a comparison.

use wgsl_lexer::Token;

/// Predeclared names that take a template list.
pub fn is_template_name(name: &str) -> bool {
    matches!(
        name,
        "vec2"
            | "vec3"
            | "vec4"
            | "mat2x2"
            | "mat2x3"
            | "mat2x4"
            | "mat3x2"
            | "mat3x3"
            | "mat3x4"
            | "mat4x2"
            | "mat4x3"
            | "mat4x4"
            | "array"
            | "ptr"
            | "atomic"
            | "bitcast"
    ) || name.starts_with("texture_")
}

/// Name usable after `@` or `.`; accepts keywords that double as names.
pub fn name_text(token: &Token) -> Option<String> {
    match token {
        Token::Ident(name) => Some(name.to_string()),
        other => other.keyword_text().map(str::to_string),
    }
}

/// Map a compound assignment token to its operator.
pub fn compound_op(token: &Token) -> Option<wgsl_ast::BinaryOp> {
    use wgsl_ast::BinaryOp;
    Some(match token {
        Token::PlusEq => BinaryOp::Add,
        Token::MinusEq => BinaryOp::Sub,
        Token::StarEq => BinaryOp::Mul,
        Token::SlashEq => BinaryOp::Div,
        Token::PercentEq => BinaryOp::Rem,
        Token::AmpEq => BinaryOp::BitAnd,
        Token::PipeEq => BinaryOp::BitOr,
        Token::CaretEq => BinaryOp::BitXor,
        Token::ShiftLeftEq => BinaryOp::Shl,
        Token::ShiftRightEq => BinaryOp::Shr,
        _ => return None,
    })
}
