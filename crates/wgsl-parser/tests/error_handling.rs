//! Parse error reporting tests.

use wgsl_parser::{parse_expr, parse_module, ParseErrorKind};

#[test]
fn test_missing_semicolon_reports_line() {
    let err = parse_module("fn main() {\n  let a = 1\n  let b = 2;\n}").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(err.line(), 3);
}

#[test]
fn test_unclosed_block_is_eof() {
    let err = parse_module("fn main() {\n  let a = 1;\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
}

#[test]
fn test_invalid_character() {
    let err = parse_module("const a = 1;\nconst b = #;").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidToken);
    assert_eq!(err.line(), 2);
}

#[test]
fn test_let_requires_initializer() {
    let err = parse_module("fn main() { let a: i32; }").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
}

#[test]
fn test_continuing_must_be_last() {
    let err = parse_module("fn main() { loop { continuing { } break; } }").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
}

#[test]
fn test_trailing_tokens_after_expression() {
    assert!(parse_expr("a + b c").is_err());
}

#[test]
fn test_display_mentions_line() {
    let err = parse_module("fn main() {\n  return 1 +;\n}").unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");
}
