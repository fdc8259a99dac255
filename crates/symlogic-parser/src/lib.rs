//! Python expression parser
//!
//! Turns expression source into the node model of `symlogic-core`. The
//! grammar covers the whole expression sublanguage, including constructs the
//! rewrite engine later refuses, so that a refusal names the construct
//! instead of failing as a syntax error.

pub mod lexer;
pub mod parse;
pub mod token;

pub use lexer::Lexer;
pub use parse::{parse_expression, parse_module, ParseError, ParseResult, Parser, DEFAULT_MAX_DEPTH};
pub use token::{Token, TokenKind};
