//! Token definitions for Python expression source

use logos::{Lexer as LogosLexer, Logos};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A token with position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text for this token
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: String, line: usize, column: usize) -> Self {
        Self { kind, text, line, column }
    }
}

/// The kind of token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"\\\r?\n")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("in")]
    In,
    #[token("is")]
    Is,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("lambda")]
    Lambda,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    // Comparison operators
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    // Arithmetic and bitwise operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,
    #[token("@")]
    At,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    // Literals; integers carry their value as decimal digits
    #[regex(r"[0-9](_?[0-9])*", lex_decimal)]
    #[regex(r"0[xX](_?[0-9a-fA-F])+", |lex| lex_radix(lex, 16))]
    #[regex(r"0[oO](_?[0-7])+", |lex| lex_radix(lex, 8))]
    #[regex(r"0[bB](_?[01])+", |lex| lex_radix(lex, 2))]
    IntLit(String),
    #[regex(r"[0-9](_?[0-9])*\.([0-9](_?[0-9])*)?([eE][+-]?[0-9]+)?", lex_float)]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9]+)?", lex_float)]
    #[regex(r"[0-9](_?[0-9])*[eE][+-]?[0-9]+", lex_float)]
    FloatLit(f64),
    #[regex(r#"[rRuU]?"([^"\\\n]|\\(.|\n))*""#, lex_string)]
    #[regex(r#"[rRuU]?'([^'\\\n]|\\(.|\n))*'"#, lex_string)]
    StringLit(String),
    #[regex(r#"([bB]|[rR][bB]|[bB][rR])"([^"\\\n]|\\(.|\n))*""#, lex_bytes)]
    #[regex(r#"([bB]|[rR][bB]|[bB][rR])'([^'\\\n]|\\(.|\n))*'"#, lex_bytes)]
    BytesLit(Vec<u8>),

    // Identifiers
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(":=")]
    ColonEq,
    #[token("=")]
    Assign,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(";")]
    Semicolon,
    #[token("\n")]
    Newline,

    // Special
    Eof,
    Error(String),
}

/// Decimal integer; leading zeros are only allowed in zero itself
fn lex_decimal(lex: &mut LogosLexer<TokenKind>) -> Option<String> {
    let digits = lex.slice().replace('_', "");
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        Some("0".to_string())
    } else if significant.len() == digits.len() {
        Some(digits)
    } else {
        None
    }
}

/// Hex, octal or binary integer, converted to decimal digits
fn lex_radix(lex: &mut LogosLexer<TokenKind>, radix: u32) -> Option<String> {
    let digits = lex.slice()[2..].replace('_', "");
    to_decimal(&digits, radix)
}

/// Convert digits in `radix` to decimal text of any length
fn to_decimal(digits: &str, radix: u32) -> Option<String> {
    if let Ok(value) = u128::from_str_radix(digits, radix) {
        return Some(value.to_string());
    }

    // Little-endian limbs of nine decimal digits each
    const LIMB: u64 = 1_000_000_000;
    let mut limbs: Vec<u64> = vec![0];
    for ch in digits.chars() {
        let mut carry = u64::from(ch.to_digit(radix)?);
        for limb in limbs.iter_mut() {
            let value = *limb * u64::from(radix) + carry;
            *limb = value % LIMB;
            carry = value / LIMB;
        }
        if carry > 0 {
            limbs.push(carry);
        }
    }

    let mut text = limbs.last().map(|limb| limb.to_string()).unwrap_or_default();
    for limb in limbs.iter().rev().skip(1) {
        text.push_str(&format!("{:09}", limb));
    }
    Some(text)
}

fn lex_float(lex: &mut LogosLexer<TokenKind>) -> Option<f64> {
    lex.slice().replace('_', "").parse().ok()
}

/// Split a string token into its prefix and the text between its quotes
fn split_literal(slice: &str) -> (&str, &str) {
    let open = slice.find(|c: char| c == '\'' || c == '"').unwrap_or(0);
    (&slice[..open], &slice[open + 1..slice.len() - 1])
}

fn is_raw(prefix: &str) -> bool {
    prefix.contains(|c: char| c == 'r' || c == 'R')
}

fn lex_string(lex: &mut LogosLexer<TokenKind>) -> Option<String> {
    let (prefix, body) = split_literal(lex.slice());
    if is_raw(prefix) {
        return Some(body.to_string());
    }
    unescape(body, false)?.into_iter().map(char::from_u32).collect()
}

/// Bytes literals may only hold ASCII source characters
fn lex_bytes(lex: &mut LogosLexer<TokenKind>) -> Option<Vec<u8>> {
    let (prefix, body) = split_literal(lex.slice());
    if !body.is_ascii() {
        return None;
    }
    if is_raw(prefix) {
        return Some(body.as_bytes().to_vec());
    }
    unescape(body, true)?.into_iter().map(|code| u8::try_from(code).ok()).collect()
}

/// Resolve backslash escapes into code points
///
/// Unknown escapes are kept verbatim, backslash included. In bytes literals
/// `\u`, `\U` and `\N` are not escapes and octal values wrap to a byte.
/// Named escapes (`\N{...}`) are refused.
fn unescape(body: &str, bytes: bool) -> Option<Vec<u32>> {
    let mut codes = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            codes.push(u32::from(ch));
            continue;
        }
        let escape = chars.next()?;
        match escape {
            // Backslash-newline continues the literal on the next line
            '\n' => {}
            '\\' | '\'' | '"' => codes.push(u32::from(escape)),
            'a' => codes.push(0x07),
            'b' => codes.push(0x08),
            'f' => codes.push(0x0c),
            'n' => codes.push(0x0a),
            'r' => codes.push(0x0d),
            't' => codes.push(0x09),
            'v' => codes.push(0x0b),
            '0'..='7' => {
                let mut code = escape.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                codes.push(if bytes { code & 0xff } else { code });
            }
            'x' => codes.push(hex_escape(&mut chars, 2)?),
            'u' if !bytes => codes.push(hex_escape(&mut chars, 4)?),
            'U' if !bytes => codes.push(hex_escape(&mut chars, 8)?),
            'N' if !bytes => return None,
            other => {
                codes.push(u32::from('\\'));
                codes.push(u32::from(other));
            }
        }
    }
    Some(codes)
}

/// Exactly `digits` hex digits
fn hex_escape(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<u32> {
    let mut code = 0;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::And => write!(f, "and"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Not => write!(f, "not"),
            TokenKind::In => write!(f, "in"),
            TokenKind::Is => write!(f, "is"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::For => write!(f, "for"),
            TokenKind::Lambda => write!(f, "lambda"),
            TokenKind::True => write!(f, "True"),
            TokenKind::False => write!(f, "False"),
            TokenKind::None => write!(f, "None"),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::DoubleStar => write!(f, "**"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::DoubleSlash => write!(f, "//"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::At => write!(f, "@"),
            TokenKind::LShift => write!(f, "<<"),
            TokenKind::RShift => write!(f, ">>"),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Tilde => write!(f, "~"),
            TokenKind::IntLit(digits) => write!(f, "{}", digits),
            TokenKind::FloatLit(n) => write!(f, "{}", n),
            TokenKind::StringLit(s) => write!(f, "{:?}", s),
            TokenKind::BytesLit(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::ColonEq => write!(f, ":="),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Ellipsis => write!(f, "..."),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}
