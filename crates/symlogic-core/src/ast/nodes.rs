//! Expression tree node definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of a parsed or rewritten expression tree
///
/// The first group of variants is what the rewrite engine accepts. The second
/// group covers host-language constructs the parser understands but which
/// have no place in a logical expression; the authorization filter rejects
/// them wherever they appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Tree root, holding exactly one statement
    Module(Box<Node>),

    /// Expression statement, holding exactly one expression
    Expr(Box<Node>),

    /// Boolean operation over two or more operands (`a and b and c`)
    BoolOp { op: BoolOp, values: Vec<Node> },

    /// Arithmetic or bitwise binary operation (`a + b`)
    BinOp { left: Box<Node>, op: BinOp, right: Box<Node> },

    /// Unary operation (`not a`, `-a`)
    UnaryOp { op: UnaryOp, operand: Box<Node> },

    /// Possibly chained comparison (`0 <= c <= 10`)
    Compare { left: Box<Node>, ops: Vec<CmpOp>, comparators: Vec<Node> },

    /// Function call
    Call { func: Box<Node>, args: Vec<Node>, keywords: Vec<Keyword> },

    /// Literal value
    Constant(Constant),

    /// Identifier
    Name(String),

    /// Attribute access (`a.b`)
    Attribute { value: Box<Node>, attr: String },

    /// Subscript (`a[b]`)
    Subscript { value: Box<Node>, slice: Box<Node> },

    /// Unpacking (`*a`)
    Starred(Box<Node>),

    /// List display
    List(Vec<Node>),

    /// Tuple display
    Tuple(Vec<Node>),

    /// Set display
    Set(Vec<Node>),

    /// Dict display
    Dict(Vec<(Node, Node)>),

    /// List comprehension (`[x for x in y]`)
    ListComp { elt: Box<Node>, generators: Vec<Comprehension> },

    /// Generator expression (`(x for x in y)`)
    GeneratorExp { elt: Box<Node>, generators: Vec<Comprehension> },

    /// Conditional expression (`a if b else c`)
    IfExp { test: Box<Node>, body: Box<Node>, orelse: Box<Node> },

    /// Lambda expression
    Lambda { params: Vec<String>, body: Box<Node> },

    /// Assignment expression (`x := v`)
    NamedExpr { target: String, value: Box<Node> },
}

impl Node {
    /// Wrap an expression as a single-statement module
    pub fn module(expr: Node) -> Self {
        Self::Module(Box::new(Self::Expr(Box::new(expr))))
    }

    /// Create a name
    pub fn name(id: impl Into<String>) -> Self {
        Self::Name(id.into())
    }

    /// Create an integer constant
    pub fn int(value: i64) -> Self {
        Self::Constant(Constant::Int(value))
    }

    /// Create a float constant
    pub fn float(value: f64) -> Self {
        Self::Constant(Constant::Float(value))
    }

    /// Create a string constant
    pub fn string(value: impl Into<String>) -> Self {
        Self::Constant(Constant::Str(value.into()))
    }

    /// Create a boolean constant
    pub fn boolean(value: bool) -> Self {
        Self::Constant(Constant::Bool(value))
    }

    /// Create a call to a named function with positional arguments only
    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::Call {
            func: Box::new(Self::name(name)),
            args,
            keywords: Vec::new(),
        }
    }

    /// Create a boolean operation
    pub fn bool_op(op: BoolOp, values: Vec<Node>) -> Self {
        Self::BoolOp { op, values }
    }

    /// Create a logical AND
    pub fn and(values: Vec<Node>) -> Self {
        Self::bool_op(BoolOp::And, values)
    }

    /// Create a logical OR
    pub fn or(values: Vec<Node>) -> Self {
        Self::bool_op(BoolOp::Or, values)
    }

    /// Create a unary operation
    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a logical NOT
    pub fn not(operand: Node) -> Self {
        Self::unary(UnaryOp::Not, operand)
    }

    /// Create a binary operation
    pub fn bin_op(left: Node, op: BinOp, right: Node) -> Self {
        Self::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a single comparison
    pub fn compare(left: Node, op: CmpOp, right: Node) -> Self {
        Self::Compare {
            left: Box::new(left),
            ops: vec![op],
            comparators: vec![right],
        }
    }

    /// Create a comparison chain
    pub fn compare_chain(left: Node, ops: Vec<CmpOp>, comparators: Vec<Node>) -> Self {
        debug_assert_eq!(ops.len(), comparators.len());
        Self::Compare {
            left: Box::new(left),
            ops,
            comparators,
        }
    }

    /// Get the tag of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Module(_) => NodeKind::Module,
            Node::Expr(_) => NodeKind::Expr,
            Node::BoolOp { .. } => NodeKind::BoolOp,
            Node::BinOp { .. } => NodeKind::BinOp,
            Node::UnaryOp { .. } => NodeKind::UnaryOp,
            Node::Compare { .. } => NodeKind::Compare,
            Node::Call { .. } => NodeKind::Call,
            Node::Constant(_) => NodeKind::Constant,
            Node::Name(_) => NodeKind::Name,
            Node::Attribute { .. } => NodeKind::Attribute,
            Node::Subscript { .. } => NodeKind::Subscript,
            Node::Starred(_) => NodeKind::Starred,
            Node::List(_) => NodeKind::List,
            Node::Tuple(_) => NodeKind::Tuple,
            Node::Set(_) => NodeKind::Set,
            Node::Dict(_) => NodeKind::Dict,
            Node::ListComp { .. } => NodeKind::ListComp,
            Node::GeneratorExp { .. } => NodeKind::GeneratorExp,
            Node::IfExp { .. } => NodeKind::IfExp,
            Node::Lambda { .. } => NodeKind::Lambda,
            Node::NamedExpr { .. } => NodeKind::NamedExpr,
        }
    }

    /// Direct child expressions, in source order
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Module(inner) | Node::Expr(inner) | Node::Starred(inner) => vec![inner.as_ref()],
            Node::BoolOp { values, .. } => values.iter().collect(),
            Node::BinOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Node::UnaryOp { operand, .. } => vec![operand.as_ref()],
            Node::Compare { left, comparators, .. } => {
                std::iter::once(left.as_ref()).chain(comparators).collect()
            },
            Node::Call { func, args, keywords } => std::iter::once(func.as_ref())
                .chain(args)
                .chain(keywords.iter().map(|k| &k.value))
                .collect(),
            Node::Constant(_) | Node::Name(_) => Vec::new(),
            Node::Attribute { value, .. } | Node::NamedExpr { value, .. } => vec![value.as_ref()],
            Node::Subscript { value, slice } => vec![value.as_ref(), slice.as_ref()],
            Node::List(elts) | Node::Tuple(elts) | Node::Set(elts) => elts.iter().collect(),
            Node::Dict(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
            Node::ListComp { elt, generators } | Node::GeneratorExp { elt, generators } => {
                let mut children = vec![elt.as_ref()];
                for generator in generators {
                    children.push(&generator.target);
                    children.push(&generator.iter);
                    children.extend(&generator.ifs);
                }
                children
            },
            Node::IfExp { test, body, orelse } => vec![test.as_ref(), body.as_ref(), orelse.as_ref()],
            Node::Lambda { body, .. } => vec![body.as_ref()],
        }
    }

    /// Nesting depth of the tree rooted here (a leaf has depth 1)
    ///
    /// Uses an explicit work list so that measuring a tree can never overflow
    /// the stack, even when the tree itself is too deep to rewrite.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((node, depth)) = pending.pop() {
            max = max.max(depth);
            pending.extend(node.children().into_iter().map(|child| (child, depth + 1)));
        }
        max
    }
}

/// Keyword argument of a call (`key=value`, or `**value` when `arg` is `None`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Node,
}

impl Keyword {
    /// Create a named keyword argument
    pub fn new(arg: impl Into<String>, value: Node) -> Self {
        Self {
            arg: Some(arg.into()),
            value,
        }
    }

    /// Create a `**mapping` argument
    pub fn splat(value: Node) -> Self {
        Self { arg: None, value }
    }
}

/// One `for ... in ... if ...` clause of a comprehension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub target: Node,
    pub iter: Node,
    pub ifs: Vec<Node>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    /// Integer outside the `i64` range, as decimal digits
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    None,
    Ellipsis,
}

/// Node tags, named after the host-language syntax classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    Expr,
    BoolOp,
    BinOp,
    UnaryOp,
    Compare,
    Call,
    Constant,
    Name,
    Keyword,
    Attribute,
    Subscript,
    Starred,
    List,
    Tuple,
    Set,
    Dict,
    ListComp,
    GeneratorExp,
    IfExp,
    Lambda,
    NamedExpr,
}

impl NodeKind {
    /// Class name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::Expr => "Expr",
            NodeKind::BoolOp => "BoolOp",
            NodeKind::BinOp => "BinOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::Compare => "Compare",
            NodeKind::Call => "Call",
            NodeKind::Constant => "Constant",
            NodeKind::Name => "Name",
            NodeKind::Keyword => "keyword",
            NodeKind::Attribute => "Attribute",
            NodeKind::Subscript => "Subscript",
            NodeKind::Starred => "Starred",
            NodeKind::List => "List",
            NodeKind::Tuple => "Tuple",
            NodeKind::Set => "Set",
            NodeKind::Dict => "Dict",
            NodeKind::ListComp => "ListComp",
            NodeKind::GeneratorExp => "GeneratorExp",
            NodeKind::IfExp => "IfExp",
            NodeKind::Lambda => "Lambda",
            NodeKind::NamedExpr => "NamedExpr",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    /// Source keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "And"),
            BoolOp::Or => write!(f, "Or"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

impl BinOp {
    /// Source symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::MatMult => "@",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::FloorDiv => "//",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::Add => "Add",
            BinOp::Sub => "Sub",
            BinOp::Mult => "Mult",
            BinOp::MatMult => "MatMult",
            BinOp::Div => "Div",
            BinOp::Mod => "Mod",
            BinOp::Pow => "Pow",
            BinOp::LShift => "LShift",
            BinOp::RShift => "RShift",
            BinOp::BitOr => "BitOr",
            BinOp::BitXor => "BitXor",
            BinOp::BitAnd => "BitAnd",
            BinOp::FloorDiv => "FloorDiv",
        };
        f.write_str(name)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOp {
    /// Source symbol (`not` carries its trailing space)
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not ",
            UnaryOp::UAdd => "+",
            UnaryOp::USub => "-",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Invert => write!(f, "Invert"),
            UnaryOp::Not => write!(f, "Not"),
            UnaryOp::UAdd => write!(f, "UAdd"),
            UnaryOp::USub => write!(f, "USub"),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,    // ==
    NotEq, // !=
    Lt,    // <
    LtE,   // <=
    Gt,    // >
    GtE,   // >=
    Is,    // is
    IsNot, // is not
    In,    // in
    NotIn, // not in
}

impl CmpOp {
    /// Source symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CmpOp::Eq => "Eq",
            CmpOp::NotEq => "NotEq",
            CmpOp::Lt => "Lt",
            CmpOp::LtE => "LtE",
            CmpOp::Gt => "Gt",
            CmpOp::GtE => "GtE",
            CmpOp::Is => "Is",
            CmpOp::IsNot => "IsNot",
            CmpOp::In => "In",
            CmpOp::NotIn => "NotIn",
        };
        f.write_str(name)
    }
}

/// An operator that can be refused by the rewrite engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Binary(BinOp),
    Compare(CmpOp),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Binary(op) => op.fmt(f),
            Operator::Compare(op) => op.fmt(f),
        }
    }
}

impl From<BinOp> for Operator {
    fn from(op: BinOp) -> Self {
        Operator::Binary(op)
    }
}

impl From<CmpOp> for Operator {
    fn from(op: CmpOp) -> Self {
        Operator::Compare(op)
    }
}
