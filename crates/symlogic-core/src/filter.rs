//! Node allow-list
//!
//! Only the constructs that make up a logical expression may reach the
//! rewrite engine. Everything else the parser can produce (containers,
//! comprehensions, attribute access, lambdas, ...) is refused here.

use crate::ast::{walk_keyword, walk_node, BoolOp, CmpOp, Keyword, Node, NodeKind, UnaryOp, Visitor};
use crate::rewrite::{TransformError, TransformResult};

/// Node kinds accepted by the rewrite engine
pub const AUTHORIZED_KINDS: &[NodeKind] = &[
    NodeKind::Module,
    NodeKind::Expr,
    NodeKind::BoolOp,
    NodeKind::BinOp,
    NodeKind::UnaryOp,
    NodeKind::Compare,
    NodeKind::Call,
    NodeKind::Constant,
    NodeKind::Name,
    NodeKind::Keyword,
];

impl NodeKind {
    /// Check if this kind is on the allow-list
    pub fn is_authorized(&self) -> bool {
        AUTHORIZED_KINDS.contains(self)
    }
}

/// Check a single node's tag, without looking at its children
pub fn authorize(node: &Node) -> TransformResult<()> {
    let kind = node.kind();
    if kind.is_authorized() {
        Ok(())
    } else {
        Err(TransformError::UnsupportedConstruct(kind))
    }
}

/// Check every node of a tree, reporting the first offender in top-down,
/// left-to-right order
pub fn authorize_tree(node: &Node) -> TransformResult<()> {
    let mut authorizer = TreeAuthorizer { error: None };
    authorizer.visit_node(node);
    match authorizer.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Check that a tree is entirely in the target vocabulary: no boolean
/// operations, no logical negation, and only single native `<`, `<=`, `>`,
/// `>=` comparisons
pub fn is_fully_rewritten(node: &Node) -> bool {
    let mut finder = ResidueFinder { found: false };
    finder.visit_node(node);
    !finder.found
}

struct TreeAuthorizer {
    error: Option<TransformError>,
}

impl Visitor for TreeAuthorizer {
    fn visit_node(&mut self, node: &Node) {
        if self.error.is_some() {
            return;
        }
        match authorize(node) {
            Ok(()) => walk_node(self, node),
            Err(err) => self.error = Some(err),
        }
    }

    fn visit_keyword(&mut self, keyword: &Keyword) {
        if self.error.is_none() {
            walk_keyword(self, keyword);
        }
    }
}

struct ResidueFinder {
    found: bool,
}

impl Visitor for ResidueFinder {
    fn visit_node(&mut self, node: &Node) {
        if self.found {
            return;
        }
        self.found = match node {
            Node::BoolOp { op: BoolOp::And | BoolOp::Or, .. } => true,
            Node::UnaryOp { op: UnaryOp::Not, .. } => true,
            Node::Compare { ops, .. } => {
                ops.len() != 1
                    || !matches!(ops[0], CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE)
            }
            _ => false,
        };
        if !self.found {
            walk_node(self, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Comprehension};

    #[test]
    fn test_authorized_kinds() {
        assert!(NodeKind::Module.is_authorized());
        assert!(NodeKind::Keyword.is_authorized());
        assert!(NodeKind::Compare.is_authorized());
        assert!(!NodeKind::ListComp.is_authorized());
        assert!(!NodeKind::Attribute.is_authorized());
        assert!(!NodeKind::Lambda.is_authorized());
    }

    #[test]
    fn test_authorize_checks_only_the_node_itself() {
        // The list inside is not looked at
        let call = Node::call("f", vec![Node::List(vec![])]);
        assert!(authorize(&call).is_ok());

        assert_eq!(
            authorize(&Node::Tuple(vec![])),
            Err(TransformError::UnsupportedConstruct(NodeKind::Tuple))
        );
    }

    #[test]
    fn test_authorize_tree_finds_nested_construct() {
        let tree = Node::module(Node::and(vec![
            Node::name("a"),
            Node::call("f", vec![Node::Attribute {
                value: Box::new(Node::name("x")),
                attr: "y".to_string(),
            }]),
        ]));
        assert_eq!(
            authorize_tree(&tree),
            Err(TransformError::UnsupportedConstruct(NodeKind::Attribute))
        );
    }

    #[test]
    fn test_authorize_tree_reports_outermost_first() {
        let comprehension = Node::ListComp {
            elt: Box::new(Node::Lambda {
                params: vec![],
                body: Box::new(Node::int(1)),
            }),
            generators: vec![Comprehension {
                target: Node::name("x"),
                iter: Node::name("xs"),
                ifs: vec![],
            }],
        };
        assert_eq!(
            authorize_tree(&comprehension),
            Err(TransformError::UnsupportedConstruct(NodeKind::ListComp))
        );
    }

    #[test]
    fn test_authorize_tree_reports_leftmost_first() {
        let tree = Node::or(vec![Node::Set(vec![]), Node::Dict(vec![])]);
        assert_eq!(
            authorize_tree(&tree),
            Err(TransformError::UnsupportedConstruct(NodeKind::Set))
        );
    }

    #[test]
    fn test_authorize_tree_checks_keyword_values() {
        let call = Node::Call {
            func: Box::new(Node::name("f")),
            args: vec![],
            keywords: vec![Keyword::new("k", Node::Starred(Box::new(Node::name("a"))))],
        };
        assert_eq!(
            authorize_tree(&call),
            Err(TransformError::UnsupportedConstruct(NodeKind::Starred))
        );
    }

    #[test]
    fn test_authorize_tree_accepts_logical_expression() {
        let tree = Node::module(Node::and(vec![
            Node::not(Node::name("a")),
            Node::compare(Node::name("b"), CmpOp::Eq, Node::int(0)),
        ]));
        assert!(authorize_tree(&tree).is_ok());
    }

    #[test]
    fn test_is_fully_rewritten() {
        let rewritten = Node::call("And", vec![
            Node::call("Not", vec![Node::name("a")]),
            Node::compare(Node::int(0), CmpOp::LtE, Node::name("c")),
            Node::bin_op(Node::name("x"), BinOp::Add, Node::int(1)),
        ]);
        assert!(is_fully_rewritten(&rewritten));
    }

    #[test]
    fn test_is_fully_rewritten_detects_residue() {
        assert!(!is_fully_rewritten(&Node::and(vec![Node::name("a"), Node::name("b")])));
        assert!(!is_fully_rewritten(&Node::call("f", vec![Node::not(Node::name("a"))])));
        assert!(!is_fully_rewritten(&Node::compare(Node::name("a"), CmpOp::Eq, Node::int(1))));
        assert!(!is_fully_rewritten(&Node::compare_chain(
            Node::int(0),
            vec![CmpOp::Lt, CmpOp::Lt],
            vec![Node::name("c"), Node::int(1)],
        )));
    }
}
