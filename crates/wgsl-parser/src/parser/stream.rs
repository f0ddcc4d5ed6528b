//! Token stream wrapper for hand-written parser.

use super::ParseError;
use std::ops::Range;
use wgsl_ast::{Expr, ExprId, ExprKind, LineIndex, Span};
use wgsl_lexer::Token;

/// Token stream with lookahead and position tracking.
///
/// Owns its tokens so a `>>` closing two nested template lists can be split
/// in place. Also hands out sequential [`ExprId`]s.
pub struct TokenStream {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    lines: LineIndex,
    next_expr_id: u32,
    /// Set while parsing a template argument, where `>` closes the list.
    pub(crate) in_template: bool,
}

impl TokenStream {
    /// Create a new token stream from tokens with their byte spans.
    pub fn new(tokens: Vec<(Token, Range<usize>)>, source: &str) -> Self {
        Self {
            tokens,
            pos: 0,
            lines: LineIndex::new(source),
            next_expr_id: 0,
            in_template: false,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let start = self.pos;
            self.advance();
            Ok(self.span_from(start))
        } else {
            Err(ParseError::expected_token(
                expected,
                self.peek().cloned(),
                self.current_span(),
            ))
        }
    }

    /// Expect an identifier and return its text.
    pub fn expect_ident(&mut self, context: &str) -> Result<String, ParseError> {
        let span = self.current_span();
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name.to_string()),
            other => Err(ParseError::unexpected_token(other.as_ref(), context, span)),
        }
    }

    /// Consume the `>` that closes a template list.
    ///
    /// `>>`, `>=` and `>>=` are split so the remainder stays in the stream.
    pub fn expect_template_close(&mut self) -> Result<(), ParseError> {
        let rest = match self.tokens.get(self.pos) {
            Some((Token::Gt, _)) => {
                self.pos += 1;
                return Ok(());
            }
            Some((Token::ShiftRight, _)) => Token::Gt,
            Some((Token::GtEq, _)) => Token::Eq,
            Some((Token::ShiftRightEq, _)) => Token::GtEq,
            _ => {
                return Err(ParseError::expected_token(
                    Token::Gt,
                    self.peek().cloned(),
                    self.current_span(),
                ))
            }
        };
        if let Some(entry) = self.tokens.get_mut(self.pos) {
            let range = entry.1.start + 1..entry.1.end;
            *entry = (rest, range);
        }
        Ok(())
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Get the current position in the token stream.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Create a span from a starting position to the current position.
    pub fn span_from(&self, start: usize) -> Span {
        let start_byte = match self.tokens.get(start) {
            Some((_, range)) => range.start,
            None => return self.current_span(),
        };
        let end_byte = if self.pos > start {
            self.tokens
                .get(self.pos - 1)
                .map(|(_, range)| range.end)
                .unwrap_or(start_byte)
        } else {
            start_byte
        };
        self.lines.span(start_byte as u32, end_byte as u32)
    }

    /// Get a span for the current token.
    pub fn current_span(&self) -> Span {
        if let Some((_, range)) = self.tokens.get(self.pos) {
            self.lines.span(range.start as u32, range.end as u32)
        } else if let Some((_, range)) = self.tokens.last() {
            self.lines.span(range.end as u32, range.end as u32)
        } else {
            Span::new(0, 0, 1)
        }
    }

    /// Build an expression node with the next sequential id.
    pub fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        Expr { id, kind, span }
    }
}
