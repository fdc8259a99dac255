//! Rewrites logical expressions written in Python syntax into the
//! call-based vocabulary of a symbolic-algebra library (`And`, `Or`, `Not`,
//! `Eq`, `Ne` plus native ordering comparisons).
//!
//! ```
//! use symlogic_core::{transform, CmpOp, Node};
//!
//! // not a and (b == 0)
//! let tree = Node::module(Node::and(vec![
//!     Node::not(Node::name("a")),
//!     Node::compare(Node::name("b"), CmpOp::Eq, Node::int(0)),
//! ]));
//!
//! let rewritten = transform(&tree).unwrap();
//! assert_eq!(rewritten.to_string(), "And(Not(a), Eq(b, 0))");
//! ```

pub mod ast;
pub mod compare;
pub mod filter;
pub mod render;
pub mod rewrite;

pub use ast::{
    BinOp, BoolOp, CmpOp, Comprehension, Constant, Keyword, Node, NodeKind, Operator, UnaryOp,
    Visitor,
};
pub use filter::{authorize, authorize_tree, is_fully_rewritten, AUTHORIZED_KINDS};
pub use rewrite::{transform, TransformError, TransformResult};
