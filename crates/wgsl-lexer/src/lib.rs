// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for WGSL.
//!
//! Tokenizes shader source with logos. Whitespace and comments are skipped,
//! every token is returned with its byte range so the parser can build spans.
//!
//! # Examples
//!
//! ```
//! # use wgsl_lexer::*;
//! let tokens = lex("let foo = 1 + 2;").unwrap();
//! assert_eq!(tokens[0].0, Token::Let);
//! ```

use logos::Logos;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use thiserror::Error;

/// Suffix on a numeric literal (`1u`, `2i`, `1.5f`, `0.5h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumSuffix {
    /// `i` - i32
    I,
    /// `u` - u32
    U,
    /// `f` - f32
    F,
    /// `h` - f16
    H,
}

/// Integer literal value with optional suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntLiteral {
    pub value: i64,
    pub suffix: Option<NumSuffix>,
}

/// Floating point literal value with optional suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatLiteral {
    pub value: f64,
    pub suffix: Option<NumSuffix>,
}

/// WGSL token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // === Keywords ===
    #[token("alias")]
    Alias,
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("const")]
    Const,
    #[token("const_assert")]
    ConstAssert,
    #[token("continue")]
    Continue,
    #[token("continuing")]
    Continuing,
    #[token("default")]
    Default,
    #[token("diagnostic")]
    Diagnostic,
    #[token("discard")]
    Discard,
    #[token("else")]
    Else,
    #[token("enable")]
    Enable,
    #[token("false")]
    False,
    #[token("fn")]
    Fn,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("let")]
    Let,
    #[token("loop")]
    Loop,
    #[token("override")]
    Override,
    #[token("requires")]
    Requires,
    #[token("return")]
    Return,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("true")]
    True,
    #[token("var")]
    Var,
    #[token("while")]
    While,

    // === Operators ===
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEq,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token("<<")]
    ShiftLeft,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token(">>")]
    ShiftRight,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShiftLeftEq,
    #[token(">>=")]
    ShiftRightEq,
    #[token("->")]
    Arrow,
    #[token("@")]
    At,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("_", priority = 3)]
    Underscore,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Integer literal (`42`, `7u`, `0xffu`)
    #[regex(r"[0-9]+[iu]?", lex_decimal_int)]
    #[regex(r"0[xX][0-9a-fA-F]+[iu]?", lex_hex_int)]
    Int(IntLiteral),

    /// Float literal (`1.0`, `.5`, `2.`, `1e-3`, `1.5f`, `3h`)
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fh]?", lex_float)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fh]?", lex_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fh]?", lex_float)]
    #[regex(r"[0-9]+[fh]", lex_float)]
    Float(FloatLiteral),

    /// Identifier. Uses `Rc<str>` for cheap cloning through the parser.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

fn split_int_suffix(text: &str) -> (&str, Option<NumSuffix>) {
    match text.as_bytes().last() {
        Some(b'u') => (&text[..text.len() - 1], Some(NumSuffix::U)),
        Some(b'i') => (&text[..text.len() - 1], Some(NumSuffix::I)),
        _ => (text, None),
    }
}

fn lex_decimal_int(lex: &mut logos::Lexer<Token>) -> Option<IntLiteral> {
    let (digits, suffix) = split_int_suffix(lex.slice());
    let value = digits.parse::<i64>().ok()?;
    Some(IntLiteral { value, suffix })
}

fn lex_hex_int(lex: &mut logos::Lexer<Token>) -> Option<IntLiteral> {
    let (digits, suffix) = split_int_suffix(lex.slice());
    let value = i64::from_str_radix(&digits[2..], 16).ok()?;
    Some(IntLiteral { value, suffix })
}

fn lex_float(lex: &mut logos::Lexer<Token>) -> Option<FloatLiteral> {
    let text = lex.slice();
    let (digits, suffix) = match text.as_bytes().last() {
        Some(b'f') => (&text[..text.len() - 1], Some(NumSuffix::F)),
        Some(b'h') => (&text[..text.len() - 1], Some(NumSuffix::H)),
        _ => (text, None),
    };
    // Rust's float parser rejects a trailing '.', WGSL accepts `2.`
    let normalized;
    let digits = if digits.ends_with('.') {
        normalized = format!("{digits}0");
        normalized.as_str()
    } else {
        digits
    };
    let value = digits.parse::<f64>().ok()?;
    Some(FloatLiteral { value, suffix })
}

impl Token {
    /// Source text of a fixed token, `None` for literals and identifiers.
    pub fn as_str(&self) -> Option<&'static str> {
        let s = match self {
            Token::Alias => "alias",
            Token::Break => "break",
            Token::Case => "case",
            Token::Const => "const",
            Token::ConstAssert => "const_assert",
            Token::Continue => "continue",
            Token::Continuing => "continuing",
            Token::Default => "default",
            Token::Diagnostic => "diagnostic",
            Token::Discard => "discard",
            Token::Else => "else",
            Token::Enable => "enable",
            Token::False => "false",
            Token::Fn => "fn",
            Token::For => "for",
            Token::If => "if",
            Token::Let => "let",
            Token::Loop => "loop",
            Token::Override => "override",
            Token::Requires => "requires",
            Token::Return => "return",
            Token::Struct => "struct",
            Token::Switch => "switch",
            Token::True => "true",
            Token::Var => "var",
            Token::While => "while",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::Bang => "!",
            Token::BangEq => "!=",
            Token::EqEq => "==",
            Token::Eq => "=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::ShiftLeft => "<<",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::ShiftRight => ">>",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::AmpEq => "&=",
            Token::PipeEq => "|=",
            Token::CaretEq => "^=",
            Token::ShiftLeftEq => "<<=",
            Token::ShiftRightEq => ">>=",
            Token::Arrow => "->",
            Token::At => "@",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Underscore => "_",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Int(_) | Token::Float(_) | Token::Ident(_) => return None,
        };
        Some(s)
    }

    /// Keyword spelling, used where a keyword doubles as an attribute name
    /// (`@diagnostic(...)`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            Token::Int(_) | Token::Float(_) | Token::Ident(_) => None,
            other => other
                .as_str()
                .filter(|s| s.chars().all(|c| c.is_ascii_alphabetic() || c == '_')),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(lit) => write!(f, "{}", lit.value),
            Token::Float(lit) => write!(f, "{}", lit.value),
            Token::Ident(name) => write!(f, "{name}"),
            other => write!(f, "{}", other.as_str().unwrap_or("?")),
        }
    }
}

/// Lexing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character {found:?} at line {line}, column {column}")]
    UnexpectedCharacter {
        found: String,
        offset: usize,
        line: u32,
        column: u32,
    },
}

impl LexError {
    fn at(source: &str, span: Range<usize>) -> Self {
        let (line, column) = line_col(source, span.start);
        LexError::UnexpectedCharacter {
            found: source.get(span.clone()).unwrap_or("").to_string(),
            offset: span.start,
            line,
            column,
        }
    }

    /// 1-based line of the offending character.
    pub fn line(&self) -> u32 {
        match self {
            LexError::UnexpectedCharacter { line, .. } => *line,
        }
    }
}

fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Tokenize `source`, pairing each token with its byte range.
pub fn lex(source: &str) -> Result<Vec<(Token, Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(LexError::at(source, span)),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        let tokens = kinds("fn main loop looped");
        assert_eq!(tokens[0], Token::Fn);
        assert_eq!(tokens[1], Token::Ident(Rc::from("main")));
        assert_eq!(tokens[2], Token::Loop);
        assert_eq!(tokens[3], Token::Ident(Rc::from("looped")));
    }

    #[test]
    fn test_int_suffixes() {
        let tokens = kinds("42 7u -3i 0xffu");
        assert_eq!(
            tokens[0],
            Token::Int(IntLiteral {
                value: 42,
                suffix: None
            })
        );
        assert_eq!(
            tokens[1],
            Token::Int(IntLiteral {
                value: 7,
                suffix: Some(NumSuffix::U)
            })
        );
        assert_eq!(tokens[2], Token::Minus);
        assert_eq!(
            tokens[4],
            Token::Int(IntLiteral {
                value: 255,
                suffix: Some(NumSuffix::U)
            })
        );
    }

    #[test]
    fn test_float_forms() {
        for (src, expected) in [("1.5", 1.5), (".25", 0.25), ("2.", 2.0), ("1e2", 100.0)] {
            match &kinds(src)[0] {
                Token::Float(lit) => assert_eq!(lit.value, expected, "{src}"),
                other => panic!("expected float for {src}, got {other:?}"),
            }
        }
        match &kinds("3h")[0] {
            Token::Float(lit) => assert_eq!(lit.suffix, Some(NumSuffix::H)),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = kinds("a // line\n/* block\n * more */ b");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_compound_operators() {
        let tokens = kinds("a >>= 1; b <<= 2; c >> d; e++");
        assert!(tokens.contains(&Token::ShiftRightEq));
        assert!(tokens.contains(&Token::ShiftLeftEq));
        assert!(tokens.contains(&Token::ShiftRight));
        assert!(tokens.contains(&Token::PlusPlus));
    }

    #[test]
    fn test_underscore_vs_ident() {
        let tokens = kinds("_ = _x;");
        assert_eq!(tokens[0], Token::Underscore);
        assert_eq!(tokens[2], Token::Ident(Rc::from("_x")));
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex("let a = 1;\nlet b = $;").unwrap_err();
        assert_eq!(err.line(), 2);
    }
}
