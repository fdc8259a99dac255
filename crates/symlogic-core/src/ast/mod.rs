//! Expression tree model
//!
//! Trees are produced by the parser, rewritten by [`crate::rewrite`] and
//! printed by [`crate::render`].

pub mod nodes;
pub mod visitor;

pub use nodes::{
    BinOp, BoolOp, CmpOp, Comprehension, Constant, Keyword, Node, NodeKind, Operator, UnaryOp,
};
pub use visitor::{walk_comprehension, walk_keyword, walk_node, Visitor};
