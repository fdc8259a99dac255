//! Parser implementation for Python expressions
//!
//! Recursive descent over the token stream, one function per precedence
//! level, lowest first. Produces the node model of `symlogic-core` in the
//! same shape the host language's own parser would: boolean operations are
//! flattened (`a or b or c` is one node with three operands) and comparison
//! chains stay a single `Compare` node.

use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use symlogic_core::{BinOp, BoolOp, CmpOp, Comprehension, Constant, Keyword, Node, UnaryOp};
use thiserror::Error;

/// Default nesting limit for parsed expressions
///
/// Each bracket level costs about twenty parser frames, so the limit keeps a
/// parse within a 2 MiB thread stack even in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{message} at line {line}, column {column}")]
    InvalidToken { message: String, line: usize, column: usize },

    #[error("Unexpected token at line {line}, column {column}: expected {expected}, got {got}")]
    UnexpectedToken { expected: String, got: String, line: usize, column: usize },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Invalid expression at line {line}, column {column}: {message}")]
    InvalidExpression { message: String, line: usize, column: usize },

    #[error("Expression is nested deeper than the limit of {limit}")]
    TooDeep { limit: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser for Python expressions
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Create a new parser from source code
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        Self {
            tokens,
            position: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole input as a single-statement module
    pub fn parse_module(&mut self) -> ParseResult<Node> {
        Ok(Node::module(self.parse_expression()?))
    }

    /// Parse the whole input as a single expression
    ///
    /// Blank lines may surround the expression; a newline anywhere else ends
    /// it, unless it sits inside brackets.
    pub fn parse_expression(&mut self) -> ParseResult<Node> {
        if let Some(error) = self.first_lex_error() {
            return Err(error);
        }

        self.depth = 0;
        self.skip_newlines();
        let expr = self.parse_expression_list()?;

        if self.check_token(&TokenKind::Semicolon) {
            self.advance();
        }
        self.skip_newlines();
        if !self.is_at_end() {
            return Err(self.unexpected("end of input"));
        }

        if expr.depth() > self.max_depth {
            return Err(ParseError::TooDeep { limit: self.max_depth });
        }
        Ok(expr)
    }

    /// An expression, including a bare tuple (`a, b`)
    fn parse_expression_list(&mut self) -> ParseResult<Node> {
        let first = self.parse_star_or_named()?;
        if !self.check_token(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.check_token(&TokenKind::Comma) {
            self.advance();
            if self.at_expression_end() {
                break;
            }
            elts.push(self.parse_star_or_named()?);
        }
        Ok(Node::Tuple(elts))
    }

    fn parse_star_or_named(&mut self) -> ParseResult<Node> {
        if self.check_token(&TokenKind::Star) {
            self.advance();
            let value = self.parse_bit_or()?;
            return Ok(Node::Starred(Box::new(value)));
        }
        self.parse_named()
    }

    /// `name := value` or a plain test
    fn parse_named(&mut self) -> ParseResult<Node> {
        if let TokenKind::Ident(target) = &self.current().kind {
            if self.peek_kind() == Some(&TokenKind::ColonEq) {
                let target = target.clone();
                self.advance();
                self.advance();
                let value = self.parse_test()?;
                return Ok(Node::NamedExpr {
                    target,
                    value: Box::new(value),
                });
            }
        }
        self.parse_test()
    }

    /// Conditional expression or lambda
    fn parse_test(&mut self) -> ParseResult<Node> {
        self.enter()?;
        let result = if self.check_token(&TokenKind::Lambda) {
            self.parse_lambda()
        } else {
            self.parse_conditional()
        };
        self.leave();
        result
    }

    fn parse_conditional(&mut self) -> ParseResult<Node> {
        let body = self.parse_or()?;
        if !self.check_token(&TokenKind::If) {
            return Ok(body);
        }

        self.advance();
        let test = self.parse_or()?;
        self.expect_token(TokenKind::Else)?;
        let orelse = self.parse_test()?;
        Ok(Node::IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_lambda(&mut self) -> ParseResult<Node> {
        self.expect_token(TokenKind::Lambda)?;

        let mut params = Vec::new();
        if !self.check_token(&TokenKind::Colon) {
            loop {
                params.push(self.expect_identifier()?);
                if self.check_token(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.expect_token(TokenKind::Colon)?;
        let body = self.parse_test()?;
        Ok(Node::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn parse_or(&mut self) -> ParseResult<Node> {
        let first = self.parse_and()?;
        if !self.check_token(&TokenKind::Or) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.check_token(&TokenKind::Or) {
            self.advance();
            values.push(self.parse_and()?);
        }
        Ok(Node::bool_op(BoolOp::Or, values))
    }

    fn parse_and(&mut self) -> ParseResult<Node> {
        let first = self.parse_not()?;
        if !self.check_token(&TokenKind::And) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.check_token(&TokenKind::And) {
            self.advance();
            values.push(self.parse_not()?);
        }
        Ok(Node::bool_op(BoolOp::And, values))
    }

    fn parse_not(&mut self) -> ParseResult<Node> {
        if !self.check_token(&TokenKind::Not) {
            return self.parse_comparison();
        }

        self.advance();
        self.enter()?;
        let operand = self.parse_not();
        self.leave();
        Ok(Node::not(operand?))
    }

    fn parse_comparison(&mut self) -> ParseResult<Node> {
        let left = self.parse_bit_or()?;

        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.parse_comparison_op() {
            ops.push(op);
            comparators.push(self.parse_bit_or()?);
        }

        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Node::compare_chain(left, ops, comparators))
        }
    }

    /// Consume a comparison operator, including the two-word forms
    fn parse_comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.current().kind {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::LtEq => CmpOp::LtE,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::GtEq => CmpOp::GtE,
            TokenKind::In => CmpOp::In,
            TokenKind::Is => {
                if self.peek_kind() == Some(&TokenKind::Not) {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            TokenKind::Not if self.peek_kind() == Some(&TokenKind::In) => {
                self.advance();
                CmpOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    // Left-associative operators build one tree level per operator, so each
    // operator counts towards the depth until its chain is finished.

    fn parse_bit_or(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_bit_xor()?;
        let mark = self.depth;
        while self.check_token(&TokenKind::Pipe) {
            self.advance();
            self.enter()?;
            let right = self.parse_bit_xor()?;
            left = Node::bin_op(left, BinOp::BitOr, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_bit_and()?;
        let mark = self.depth;
        while self.check_token(&TokenKind::Caret) {
            self.advance();
            self.enter()?;
            let right = self.parse_bit_and()?;
            left = Node::bin_op(left, BinOp::BitXor, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_shift()?;
        let mark = self.depth;
        while self.check_token(&TokenKind::Amp) {
            self.advance();
            self.enter()?;
            let right = self.parse_shift()?;
            left = Node::bin_op(left, BinOp::BitAnd, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_arith()?;
        let mark = self.depth;
        loop {
            let op = match self.current().kind {
                TokenKind::LShift => BinOp::LShift,
                TokenKind::RShift => BinOp::RShift,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let right = self.parse_arith()?;
            left = Node::bin_op(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_arith(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_term()?;
        let mark = self.depth;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let right = self.parse_term()?;
            left = Node::bin_op(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_factor()?;
        let mark = self.depth;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mult,
                TokenKind::At => BinOp::MatMult,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let right = self.parse_factor()?;
            left = Node::bin_op(left, op, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_factor(&mut self) -> ParseResult<Node> {
        let op = match self.current().kind {
            TokenKind::Plus => UnaryOp::UAdd,
            TokenKind::Minus => UnaryOp::USub,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };

        self.advance();
        self.enter()?;
        let operand = self.parse_factor();
        self.leave();
        Ok(Node::unary(op, operand?))
    }

    /// `**` binds tighter than a unary operator on its left and looser than
    /// one on its right: `-a ** -b` is `-(a ** (-b))`
    fn parse_power(&mut self) -> ParseResult<Node> {
        let base = self.parse_primary()?;
        if !self.check_token(&TokenKind::DoubleStar) {
            return Ok(base);
        }

        self.advance();
        self.enter()?;
        let exponent = self.parse_factor();
        self.leave();
        Ok(Node::bin_op(base, BinOp::Pow, exponent?))
    }

    /// An atom followed by any number of calls, subscripts and attribute
    /// accesses, each one level deeper than the last
    fn parse_primary(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_atom()?;
        let mark = self.depth;
        loop {
            if matches!(
                self.current().kind,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot
            ) {
                self.enter()?;
            }
            match self.current().kind {
                TokenKind::LParen => {
                    self.advance();
                    let (args, keywords) = self.parse_call_arguments()?;
                    self.expect_token(TokenKind::RParen)?;
                    node = Node::Call {
                        func: Box::new(node),
                        args,
                        keywords,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let slice = self.parse_expression_list()?;
                    self.expect_token(TokenKind::RBracket)?;
                    node = Node::Subscript {
                        value: Box::new(node),
                        slice: Box::new(slice),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_identifier()?;
                    node = Node::Attribute {
                        value: Box::new(node),
                        attr,
                    };
                }
                _ => {
                    self.depth = mark;
                    return Ok(node);
                }
            }
        }
    }

    fn parse_call_arguments(&mut self) -> ParseResult<(Vec<Node>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !self.check_token(&TokenKind::RParen) {
            if self.check_token(&TokenKind::DoubleStar) {
                self.advance();
                keywords.push(Keyword::splat(self.parse_test()?));
            } else if let (TokenKind::Ident(arg), Some(TokenKind::Assign)) =
                (&self.current().kind, self.peek_kind())
            {
                let arg = arg.clone();
                self.advance();
                self.advance();
                keywords.push(Keyword::new(arg, self.parse_test()?));
            } else {
                if !keywords.is_empty() {
                    return Err(self.invalid("positional argument follows keyword argument"));
                }
                let arg = self.parse_star_or_named()?;
                if self.check_token(&TokenKind::For) {
                    // f(x for x in xs)
                    let generators = self.parse_comprehension_clauses()?;
                    args.push(Node::GeneratorExp {
                        elt: Box::new(arg),
                        generators,
                    });
                } else {
                    args.push(arg);
                }
            }

            if self.check_token(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        Ok((args, keywords))
    }

    fn parse_atom(&mut self) -> ParseResult<Node> {
        let token_kind = self.current().kind.clone();

        match token_kind {
            TokenKind::Ident(id) => {
                self.advance();
                Ok(Node::Name(id))
            }

            // Literals
            TokenKind::IntLit(digits) => {
                self.advance();
                Ok(match digits.parse() {
                    Ok(n) => Node::int(n),
                    Err(_) => Node::Constant(Constant::BigInt(digits)),
                })
            }
            TokenKind::FloatLit(x) => {
                self.advance();
                Ok(Node::float(x))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                // Adjacent literals concatenate: 'a' 'b' == 'ab'
                let mut value = s;
                loop {
                    match &self.current().kind {
                        TokenKind::StringLit(next) => value.push_str(next),
                        TokenKind::BytesLit(_) => return Err(self.mixed_literals()),
                        _ => break,
                    }
                    self.advance();
                }
                Ok(Node::string(value))
            }
            TokenKind::BytesLit(b) => {
                self.advance();
                let mut value = b;
                loop {
                    match &self.current().kind {
                        TokenKind::BytesLit(next) => value.extend_from_slice(next),
                        TokenKind::StringLit(_) => return Err(self.mixed_literals()),
                        _ => break,
                    }
                    self.advance();
                }
                Ok(Node::Constant(Constant::Bytes(value)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Node::boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Node::boolean(false))
            }
            TokenKind::None => {
                self.advance();
                Ok(Node::Constant(Constant::None))
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Node::Constant(Constant::Ellipsis))
            }

            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_dict_or_set(),

            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                expected: "expression".to_string(),
            }),

            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parenthesized expression, tuple or generator expression
    fn parse_parenthesized(&mut self) -> ParseResult<Node> {
        self.expect_token(TokenKind::LParen)?;
        if self.check_token(&TokenKind::RParen) {
            self.advance();
            return Ok(Node::Tuple(Vec::new()));
        }

        let first = self.parse_star_or_named()?;

        if self.check_token(&TokenKind::For) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_token(TokenKind::RParen)?;
            return Ok(Node::GeneratorExp {
                elt: Box::new(first),
                generators,
            });
        }

        if !self.check_token(&TokenKind::Comma) {
            self.expect_token(TokenKind::RParen)?;
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.check_token(&TokenKind::Comma) {
            self.advance();
            if self.check_token(&TokenKind::RParen) {
                break;
            }
            elts.push(self.parse_star_or_named()?);
        }
        self.expect_token(TokenKind::RParen)?;
        Ok(Node::Tuple(elts))
    }

    /// List display or list comprehension
    fn parse_list(&mut self) -> ParseResult<Node> {
        self.expect_token(TokenKind::LBracket)?;
        if self.check_token(&TokenKind::RBracket) {
            self.advance();
            return Ok(Node::List(Vec::new()));
        }

        let first = self.parse_star_or_named()?;

        if self.check_token(&TokenKind::For) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_token(TokenKind::RBracket)?;
            return Ok(Node::ListComp {
                elt: Box::new(first),
                generators,
            });
        }

        let mut elts = vec![first];
        while self.check_token(&TokenKind::Comma) {
            self.advance();
            if self.check_token(&TokenKind::RBracket) {
                break;
            }
            elts.push(self.parse_star_or_named()?);
        }
        self.expect_token(TokenKind::RBracket)?;
        Ok(Node::List(elts))
    }

    /// `{}` is an empty dict; `{a}` a set; `{k: v}` a dict
    fn parse_dict_or_set(&mut self) -> ParseResult<Node> {
        self.expect_token(TokenKind::LBrace)?;
        if self.check_token(&TokenKind::RBrace) {
            self.advance();
            return Ok(Node::Dict(Vec::new()));
        }

        let first = self.parse_test()?;

        if self.check_token(&TokenKind::Colon) {
            self.advance();
            let mut entries = vec![(first, self.parse_test()?)];
            while self.check_token(&TokenKind::Comma) {
                self.advance();
                if self.check_token(&TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_test()?;
                self.expect_token(TokenKind::Colon)?;
                entries.push((key, self.parse_test()?));
            }
            self.expect_token(TokenKind::RBrace)?;
            return Ok(Node::Dict(entries));
        }

        let mut elts = vec![first];
        while self.check_token(&TokenKind::Comma) {
            self.advance();
            if self.check_token(&TokenKind::RBrace) {
                break;
            }
            elts.push(self.parse_test()?);
        }
        self.expect_token(TokenKind::RBrace)?;
        Ok(Node::Set(elts))
    }

    /// One or more `for target in iter [if cond]...` clauses
    fn parse_comprehension_clauses(&mut self) -> ParseResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.check_token(&TokenKind::For) {
            self.advance();
            let target = self.parse_target_list()?;
            self.expect_token(TokenKind::In)?;
            let iter = self.parse_or()?;

            let mut ifs = Vec::new();
            while self.check_token(&TokenKind::If) {
                self.advance();
                ifs.push(self.parse_or()?);
            }

            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn parse_target_list(&mut self) -> ParseResult<Node> {
        let first = self.parse_bit_or()?;
        if !self.check_token(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.check_token(&TokenKind::Comma) {
            self.advance();
            if self.check_token(&TokenKind::In) {
                break;
            }
            elts.push(self.parse_bit_or()?);
        }
        Ok(Node::Tuple(elts))
    }

    // Helper methods

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.depth -= 1;
            return Err(ParseError::TooDeep { limit: self.max_depth });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn skip_newlines(&mut self) {
        while self.check_token(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn first_lex_error(&self) -> Option<ParseError> {
        self.tokens.iter().find_map(|token| match &token.kind {
            TokenKind::Error(message) => Some(ParseError::InvalidToken {
                message: message.clone(),
                line: token.line,
                column: token.column,
            }),
            _ => None,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn at_expression_end(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Eof
                | TokenKind::Semicolon
                | TokenKind::Newline
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    fn check_token(&self, kind: &TokenKind) -> bool {
        !self.is_at_end() && &self.current().kind == kind
    }

    fn expect_token(&mut self, expected: TokenKind) -> ParseResult<()> {
        if self.check_token(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match &self.current().kind {
            TokenKind::Ident(s) => {
                let result = s.clone();
                self.advance();
                Ok(result)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            return ParseError::UnexpectedEof {
                expected: expected.to_string(),
            };
        }
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            got: token.kind.to_string(),
            line: token.line,
            column: token.column,
        }
    }

    fn mixed_literals(&self) -> ParseError {
        self.invalid("cannot mix bytes and nonbytes literals")
    }

    fn invalid(&self, message: &str) -> ParseError {
        let token = self.current();
        ParseError::InvalidExpression {
            message: message.to_string(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Parse source into a single-statement module
pub fn parse_module(source: &str) -> ParseResult<Node> {
    Parser::new(source).parse_module()
}

/// Parse source into a bare expression
pub fn parse_expression(source: &str) -> ParseResult<Node> {
    Parser::new(source).parse_expression()
}
