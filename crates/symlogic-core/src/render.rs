//! Source rendering
//!
//! Prints a tree as Python source, which for a rewritten tree is also valid
//! input for the symbolic-algebra interpreter. Parentheses are emitted only
//! where operator precedence requires them, so `Or(a, b < 0)` prints as
//! written and `(a + b) * c` keeps its grouping.

use crate::ast::{BinOp, BoolOp, Comprehension, Constant, Keyword, Node, UnaryOp};
use std::fmt::{self, Write};

/// Binding strength, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    NamedExpr,
    Tuple,
    Test,
    Or,
    And,
    Not,
    Cmp,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Arith,
    Term,
    Factor,
    Power,
    Await,
    Atom,
}

impl Precedence {
    fn next(self) -> Self {
        use Precedence::*;
        match self {
            NamedExpr => Tuple,
            Tuple => Test,
            Test => Or,
            Or => And,
            And => Not,
            Not => Cmp,
            Cmp => BitOr,
            BitOr => BitXor,
            BitXor => BitAnd,
            BitAnd => Shift,
            Shift => Arith,
            Arith => Term,
            Term => Factor,
            Factor => Power,
            Power => Await,
            Await | Atom => Atom,
        }
    }

    fn of_bool_op(op: BoolOp) -> Self {
        match op {
            BoolOp::Or => Precedence::Or,
            BoolOp::And => Precedence::And,
        }
    }

    fn of_bin_op(op: BinOp) -> Self {
        match op {
            BinOp::BitOr => Precedence::BitOr,
            BinOp::BitXor => Precedence::BitXor,
            BinOp::BitAnd => Precedence::BitAnd,
            BinOp::LShift | BinOp::RShift => Precedence::Shift,
            BinOp::Add | BinOp::Sub => Precedence::Arith,
            BinOp::Mult | BinOp::MatMult | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => {
                Precedence::Term
            }
            BinOp::Pow => Precedence::Power,
        }
    }

    fn of(node: &Node) -> Self {
        match node {
            Node::NamedExpr { .. } => Precedence::NamedExpr,
            Node::IfExp { .. } | Node::Lambda { .. } => Precedence::Test,
            Node::BoolOp { op, .. } => Self::of_bool_op(*op),
            Node::UnaryOp { op: UnaryOp::Not, .. } => Precedence::Not,
            Node::UnaryOp { .. } => Precedence::Factor,
            Node::Compare { .. } => Precedence::Cmp,
            Node::BinOp { op, .. } => Self::of_bin_op(*op),
            Node::Starred(_) => Precedence::BitOr,
            // A negative literal prints with its sign, like a unary minus
            Node::Constant(Constant::Int(n)) if *n < 0 => Precedence::Factor,
            Node::Constant(Constant::BigInt(digits)) if digits.starts_with('-') => {
                Precedence::Factor
            }
            Node::Constant(Constant::Float(x)) if x.is_sign_negative() => Precedence::Factor,
            _ => Precedence::Atom,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, Precedence::Tuple)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(n) => write!(f, "{}", n),
            Constant::BigInt(digits) => f.write_str(digits),
            Constant::Float(x) => write_float(f, *x),
            Constant::Str(s) => write_str_literal(f, s),
            Constant::Bytes(bytes) => write_bytes_literal(f, bytes),
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::None => f.write_str("None"),
            Constant::Ellipsis => f.write_str("..."),
        }
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, min: Precedence) -> fmt::Result {
    let own = Precedence::of(node);
    if own < min {
        f.write_char('(')?;
        write_bare(f, node, own)?;
        f.write_char(')')
    } else {
        write_bare(f, node, own)
    }
}

fn write_bare(f: &mut fmt::Formatter<'_>, node: &Node, own: Precedence) -> fmt::Result {
    match node {
        Node::Module(stmt) | Node::Expr(stmt) => write_node(f, stmt, Precedence::Tuple),

        Node::BoolOp { op, values } => {
            let separator = format!(" {} ", op.keyword());
            write_separated(f, values, &separator, own.next())
        }

        Node::BinOp { left, op, right } => {
            let (left_min, right_min) = if *op == BinOp::Pow {
                (own.next(), own)
            } else {
                (own, own.next())
            };
            write_node(f, left, left_min)?;
            write!(f, " {} ", op.symbol())?;
            write_node(f, right, right_min)
        }

        Node::UnaryOp { op, operand } => {
            f.write_str(op.symbol())?;
            write_node(f, operand, own)
        }

        Node::Compare { left, ops, comparators } => {
            write_node(f, left, own.next())?;
            for (op, comparator) in ops.iter().zip(comparators) {
                write!(f, " {} ", op.symbol())?;
                write_node(f, comparator, own.next())?;
            }
            Ok(())
        }

        Node::Call { func, args, keywords } => {
            write_node(f, func, Precedence::Atom)?;
            f.write_char('(')?;
            write_separated(f, args, ", ", Precedence::Test)?;
            for (i, keyword) in keywords.iter().enumerate() {
                if i > 0 || !args.is_empty() {
                    f.write_str(", ")?;
                }
                write_keyword(f, keyword)?;
            }
            f.write_char(')')
        }

        Node::Constant(value) => write!(f, "{}", value),

        Node::Name(id) => f.write_str(id),

        Node::Attribute { value, attr } => {
            write_node(f, value, Precedence::Atom)?;
            write!(f, ".{}", attr)
        }

        Node::Subscript { value, slice } => {
            write_node(f, value, Precedence::Atom)?;
            f.write_char('[')?;
            write_node(f, slice, Precedence::Tuple)?;
            f.write_char(']')
        }

        Node::Starred(value) => {
            f.write_char('*')?;
            write_node(f, value, Precedence::BitOr)
        }

        Node::List(elts) => {
            f.write_char('[')?;
            write_separated(f, elts, ", ", Precedence::Test)?;
            f.write_char(']')
        }

        Node::Tuple(elts) => {
            f.write_char('(')?;
            write_separated(f, elts, ", ", Precedence::Test)?;
            if elts.len() == 1 {
                f.write_char(',')?;
            }
            f.write_char(')')
        }

        Node::Set(elts) if elts.is_empty() => f.write_str("set()"),

        Node::Set(elts) => {
            f.write_char('{')?;
            write_separated(f, elts, ", ", Precedence::Test)?;
            f.write_char('}')
        }

        Node::Dict(entries) => {
            f.write_char('{')?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_node(f, key, Precedence::Test)?;
                f.write_str(": ")?;
                write_node(f, value, Precedence::Test)?;
            }
            f.write_char('}')
        }

        Node::ListComp { elt, generators } => {
            f.write_char('[')?;
            write_comprehension(f, elt, generators)?;
            f.write_char(']')
        }

        Node::GeneratorExp { elt, generators } => {
            f.write_char('(')?;
            write_comprehension(f, elt, generators)?;
            f.write_char(')')
        }

        Node::IfExp { test, body, orelse } => {
            write_node(f, body, own.next())?;
            f.write_str(" if ")?;
            write_node(f, test, own.next())?;
            f.write_str(" else ")?;
            write_node(f, orelse, own)
        }

        Node::Lambda { params, body } => {
            f.write_str("lambda")?;
            if !params.is_empty() {
                write!(f, " {}", params.join(", "))?;
            }
            f.write_str(": ")?;
            write_node(f, body, Precedence::Test)
        }

        Node::NamedExpr { target, value } => {
            write!(f, "{} := ", target)?;
            write_node(f, value, Precedence::Tuple)
        }
    }
}

fn write_separated(
    f: &mut fmt::Formatter<'_>,
    nodes: &[Node],
    separator: &str,
    min: Precedence,
) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write_node(f, node, min)?;
    }
    Ok(())
}

fn write_keyword(f: &mut fmt::Formatter<'_>, keyword: &Keyword) -> fmt::Result {
    match &keyword.arg {
        Some(arg) => write!(f, "{}=", arg)?,
        None => f.write_str("**")?,
    }
    write_node(f, &keyword.value, Precedence::Test)
}

fn write_comprehension(
    f: &mut fmt::Formatter<'_>,
    elt: &Node,
    generators: &[Comprehension],
) -> fmt::Result {
    write_node(f, elt, Precedence::Test)?;
    for generator in generators {
        f.write_str(" for ")?;
        write_node(f, &generator.target, Precedence::Tuple)?;
        f.write_str(" in ")?;
        write_node(f, &generator.iter, Precedence::Or)?;
        for condition in &generator.ifs {
            f.write_str(" if ")?;
            write_node(f, condition, Precedence::Or)?;
        }
    }
    Ok(())
}

/// Floats print the way the host language's `repr` does: always with a
/// fractional part or an exponent, exponents signed and at least two digits
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        return f.write_str("nan");
    }
    if value.is_infinite() {
        return f.write_str(if value > 0.0 { "inf" } else { "-inf" });
    }

    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            write!(f, "{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => f.write_str(&repr),
    }
}

/// Strings print single-quoted unless they contain a single quote and no
/// double quote
fn write_str_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let quote = if value.contains('\'') && !value.contains('"') { '"' } else { '\'' };
    f.write_char(quote)?;
    for ch in value.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c if is_printable(c) => f.write_char(c)?,
            c => match c as u32 {
                code @ 0..=0xff => write!(f, "\\x{:02x}", code)?,
                code @ 0x100..=0xffff => write!(f, "\\u{:04x}", code)?,
                code => write!(f, "\\U{:08x}", code)?,
            },
        }
    }
    f.write_char(quote)
}

/// Control characters and separators other than the plain space are
/// escaped, matching `str.isprintable`
fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace() || ('\u{200b}'..='\u{200f}').contains(&c))
}

/// Bytes print as `b'...'` with every non-ASCII or unprintable byte as `\xhh`
fn write_bytes_literal(f: &mut fmt::Formatter<'_>, value: &[u8]) -> fmt::Result {
    let quote = if value.contains(&b'\'') && !value.contains(&b'"') { b'"' } else { b'\'' };
    write!(f, "b{}", quote as char)?;
    for &byte in value {
        match byte {
            b'\\' => f.write_str("\\\\")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            b if b == quote => write!(f, "\\{}", b as char)?,
            0x20..=0x7e => f.write_char(byte as char)?,
            _ => write!(f, "\\x{:02x}", byte)?,
        }
    }
    f.write_char(quote as char)
}
