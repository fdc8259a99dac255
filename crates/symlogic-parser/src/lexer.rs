//! Lexer for Python expression source
//!
//! Wraps the generated `logos` lexer and attaches line/column positions to
//! every token. The stream always ends with a single `Eof` token; input that
//! cannot be tokenized becomes an `Error` token carrying a message.
//!
//! Newlines inside brackets are dropped, so an expression may span lines
//! only within `()`, `[]` or `{}`.

use super::token::{Token, TokenKind};
use logos::Logos;

/// Lexer for tokenizing expression source
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    /// Byte offset up to which `line`/`column` have been computed
    scanned: usize,
    line: usize,
    column: usize,
    /// Open bracket count; unbalanced closers do not go below zero
    nesting: usize,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer from source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            scanned: 0,
            line: 1,
            column: 1,
            nesting: 0,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        loop {
            match self.inner.next() {
                Some(Ok(TokenKind::Newline)) if self.nesting > 0 => continue,
                next => return self.make_token(next),
            }
        }
    }

    fn make_token(&mut self, next: Option<Result<TokenKind, ()>>) -> Token {
        match next {
            Some(result) => {
                let span = self.inner.span();
                let (line, column) = self.position_of(span.start);
                let text = self.source[span].to_string();
                let kind = match result {
                    Ok(kind) => kind,
                    Err(()) => TokenKind::Error(describe_invalid(&text)),
                };
                match kind {
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        self.nesting += 1
                    }
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                        self.nesting = self.nesting.saturating_sub(1)
                    }
                    _ => {}
                }
                Token::new(kind, text, line, column)
            }
            None => {
                let (line, column) = self.position_of(self.source.len());
                Token::new(TokenKind::Eof, String::new(), line, column)
            }
        }
    }

    /// Tokenize all input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Advance the line/column counters to a byte offset. Offsets only move
    /// forward, so the whole source is scanned once.
    fn position_of(&mut self, offset: usize) -> (usize, usize) {
        for ch in self.source[self.scanned..offset].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.scanned = offset;
        (self.line, self.column)
    }
}

fn describe_invalid(text: &str) -> String {
    let quoted = text.trim_start_matches(|c: char| "rRbBuU".contains(c));
    match quoted.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("Invalid number literal: {}", text),
        Some(quote @ ('\'' | '"')) => {
            if quoted.len() >= 2 && quoted.ends_with(quote) {
                format!("Invalid string literal: {}", text)
            } else {
                "Unterminated string literal".to_string()
            }
        }
        _ => format!("Unexpected character: {}", text),
    }
}
