//! Rewrite engine
//!
//! Turns a tree written with host-language boolean operators into the
//! call-based vocabulary of the symbolic-algebra library:
//!
//! | input          | output                  |
//! |----------------|-------------------------|
//! | `a and b`      | `And(a, b)`             |
//! | `a or b or c`  | `Or(a, b, c)`           |
//! | `not a`        | `Not(a)`                |
//! | `a == b`       | `Eq(a, b)`              |
//! | `a != b`       | `Ne(a, b)`              |
//! | `0 <= c <= 10` | `And(0 <= c, c <= 10)`  |
//!
//! The input tree is only borrowed; the result is built from fresh nodes.

use crate::ast::{BinOp, BoolOp, Keyword, Node, NodeKind, Operator, UnaryOp};
use crate::compare::decompose;
use crate::filter::authorize;
use thiserror::Error;

/// Rewrite failure
///
/// Every variant is terminal: the first one raised aborts the rewrite and
/// no partial tree is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{0} node is not supported.")]
    UnsupportedConstruct(NodeKind),

    #[error("Sympy does not support the {0} operator, so the transformation is impossible.")]
    UnsupportedOperator(Operator),

    #[error("Compare node has {ops} operators for {comparators} comparators.")]
    MalformedCompare { ops: usize, comparators: usize },
}

pub type TransformResult<T> = Result<T, TransformError>;

/// Rewrite a tree into the symbolic-algebra vocabulary
pub fn transform(node: &Node) -> TransformResult<Node> {
    authorize(node)?;

    match node {
        Node::Module(stmt) => Ok(Node::Module(Box::new(transform(stmt)?))),

        Node::Expr(expr) => Ok(Node::Expr(Box::new(transform(expr)?))),

        Node::BoolOp { op, values } => {
            let values = transform_all(values)?;
            let callee = match op {
                BoolOp::And => "And",
                BoolOp::Or => "Or",
            };
            Ok(Node::call(callee, values))
        }

        Node::UnaryOp { op, operand } => {
            let operand = transform(operand)?;
            match op {
                UnaryOp::Not => Ok(Node::call("Not", vec![operand])),
                UnaryOp::USub | UnaryOp::UAdd | UnaryOp::Invert => Ok(Node::unary(*op, operand)),
            }
        }

        Node::BinOp { left, op, right } => {
            let left = transform(left)?;
            let right = transform(right)?;
            if !has_symbolic_equivalent(*op) {
                return Err(TransformError::UnsupportedOperator(Operator::Binary(*op)));
            }
            Ok(Node::bin_op(left, *op, right))
        }

        Node::Compare { left, ops, comparators } => decompose(left, ops, comparators),

        Node::Call { func, args, keywords } => {
            let func = transform(func)?;
            let args = transform_all(args)?;
            let keywords = keywords
                .iter()
                .map(transform_keyword)
                .collect::<TransformResult<Vec<_>>>()?;
            Ok(Node::Call {
                func: Box::new(func),
                args,
                keywords,
            })
        }

        Node::Constant(value) => Ok(Node::Constant(value.clone())),

        Node::Name(id) => Ok(Node::Name(id.clone())),

        // Refused by `authorize` above
        Node::Attribute { .. }
        | Node::Subscript { .. }
        | Node::Starred(_)
        | Node::List(_)
        | Node::Tuple(_)
        | Node::Set(_)
        | Node::Dict(_)
        | Node::ListComp { .. }
        | Node::GeneratorExp { .. }
        | Node::IfExp { .. }
        | Node::Lambda { .. }
        | Node::NamedExpr { .. } => Err(TransformError::UnsupportedConstruct(node.kind())),
    }
}

/// Rewrite a sequence of nodes, stopping at the first failure
pub(crate) fn transform_all(nodes: &[Node]) -> TransformResult<Vec<Node>> {
    nodes.iter().map(transform).collect()
}

fn transform_keyword(keyword: &Keyword) -> TransformResult<Keyword> {
    Ok(Keyword {
        arg: keyword.arg.clone(),
        value: transform(&keyword.value)?,
    })
}

/// Arithmetic operators carry over; bitwise, shift and matrix operators
/// have no counterpart in the target vocabulary
fn has_symbolic_equivalent(op: BinOp) -> bool {
    match op {
        BinOp::Add
        | BinOp::Sub
        | BinOp::Mult
        | BinOp::Div
        | BinOp::Mod
        | BinOp::Pow
        | BinOp::FloorDiv => true,
        BinOp::MatMult
        | BinOp::LShift
        | BinOp::RShift
        | BinOp::BitOr
        | BinOp::BitXor
        | BinOp::BitAnd => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CmpOp, Comprehension, Constant};
    use crate::filter::{authorize_tree, is_fully_rewritten};

    fn name(id: &str) -> Node {
        Node::name(id)
    }

    #[test]
    fn test_module_wrapper_is_kept() {
        let tree = Node::module(Node::not(name("a")));
        let result = transform(&tree).unwrap();
        assert_eq!(result, Node::module(Node::call("Not", vec![name("a")])));
    }

    #[test]
    fn test_or_preserves_operand_order() {
        let expr = Node::or(vec![name("a"), name("b"), name("c")]);
        let result = transform(&expr).unwrap();
        assert_eq!(result, Node::call("Or", vec![name("a"), name("b"), name("c")]));
    }

    #[test]
    fn test_and_with_not_and_equality() {
        // not a and (b == 0)
        let expr = Node::and(vec![
            Node::not(name("a")),
            Node::compare(name("b"), CmpOp::Eq, Node::int(0)),
        ]);
        let result = transform(&expr).unwrap();
        assert_eq!(
            result,
            Node::call("And", vec![
                Node::call("Not", vec![name("a")]),
                Node::call("Eq", vec![name("b"), Node::int(0)]),
            ])
        );
    }

    #[test]
    fn test_nested_bool_ops() {
        // a or (b and not c)
        let expr = Node::or(vec![name("a"), Node::and(vec![name("b"), Node::not(name("c"))])]);
        let result = transform(&expr).unwrap();
        assert_eq!(
            result,
            Node::call("Or", vec![
                name("a"),
                Node::call("And", vec![name("b"), Node::call("Not", vec![name("c")])]),
            ])
        );
    }

    #[test]
    fn test_arithmetic_unary_passes_through() {
        for op in [UnaryOp::USub, UnaryOp::UAdd, UnaryOp::Invert] {
            let expr = Node::unary(op, name("x"));
            assert_eq!(transform(&expr).unwrap(), expr);
        }
    }

    #[test]
    fn test_unary_operand_is_rewritten() {
        let expr = Node::unary(UnaryOp::USub, Node::call("f", vec![Node::not(name("a"))]));
        let result = transform(&expr).unwrap();
        assert_eq!(
            result,
            Node::unary(UnaryOp::USub, Node::call("f", vec![Node::call("Not", vec![name("a")])]))
        );
    }

    #[test]
    fn test_arithmetic_binary_passes_through() {
        for op in [
            BinOp::Add,
            BinOp::Sub,
            BinOp::Mult,
            BinOp::Div,
            BinOp::Mod,
            BinOp::Pow,
            BinOp::FloorDiv,
        ] {
            let expr = Node::bin_op(name("x"), op, Node::int(2));
            assert_eq!(transform(&expr).unwrap(), expr);
        }
    }

    #[test]
    fn test_bitwise_binary_rejected() {
        for op in [
            BinOp::MatMult,
            BinOp::LShift,
            BinOp::RShift,
            BinOp::BitOr,
            BinOp::BitXor,
            BinOp::BitAnd,
        ] {
            let expr = Node::bin_op(name("a"), op, name("b"));
            assert_eq!(
                transform(&expr),
                Err(TransformError::UnsupportedOperator(Operator::Binary(op)))
            );
        }
    }

    #[test]
    fn test_operand_construct_error_wins_over_operator() {
        // [x] & b: the list is reached before the operator is examined
        let expr = Node::bin_op(Node::List(vec![name("x")]), BinOp::BitAnd, name("b"));
        assert_eq!(
            transform(&expr),
            Err(TransformError::UnsupportedConstruct(NodeKind::List))
        );
    }

    #[test]
    fn test_first_error_aborts() {
        // (a | b) or (c ^ d): the left operand fails first
        let expr = Node::or(vec![
            Node::bin_op(name("a"), BinOp::BitOr, name("b")),
            Node::bin_op(name("c"), BinOp::BitXor, name("d")),
        ]);
        assert_eq!(
            transform(&expr),
            Err(TransformError::UnsupportedOperator(Operator::Binary(BinOp::BitOr)))
        );
    }

    #[test]
    fn test_call_arguments_and_keywords_rewritten() {
        let call = Node::Call {
            func: Box::new(name("f")),
            args: vec![Node::and(vec![name("a"), name("b")])],
            keywords: vec![Keyword::new("k", Node::not(name("c")))],
        };
        let result = transform(&call).unwrap();
        assert_eq!(
            result,
            Node::Call {
                func: Box::new(name("f")),
                args: vec![Node::call("And", vec![name("a"), name("b")])],
                keywords: vec![Keyword::new("k", Node::call("Not", vec![name("c")]))],
            }
        );
    }

    #[test]
    fn test_call_with_attribute_callee_rejected() {
        let call = Node::Call {
            func: Box::new(Node::Attribute {
                value: Box::new(name("math")),
                attr: "sin".to_string(),
            }),
            args: vec![name("x")],
            keywords: vec![],
        };
        assert_eq!(
            transform(&call),
            Err(TransformError::UnsupportedConstruct(NodeKind::Attribute))
        );
    }

    #[test]
    fn test_leaves_copied() {
        for leaf in [
            Node::int(3),
            Node::float(2.5),
            Node::string("s"),
            Node::boolean(true),
            Node::Constant(Constant::None),
            name("x"),
        ] {
            assert_eq!(transform(&leaf).unwrap(), leaf);
        }
    }

    #[test]
    fn test_unsupported_constructs() {
        let comprehension = Node::ListComp {
            elt: Box::new(name("x")),
            generators: vec![Comprehension {
                target: name("x"),
                iter: name("xs"),
                ifs: vec![],
            }],
        };
        let cases = [
            (comprehension, NodeKind::ListComp),
            (Node::Tuple(vec![name("a")]), NodeKind::Tuple),
            (
                Node::IfExp {
                    test: Box::new(name("a")),
                    body: Box::new(name("b")),
                    orelse: Box::new(name("c")),
                },
                NodeKind::IfExp,
            ),
            (
                Node::NamedExpr {
                    target: "x".to_string(),
                    value: Box::new(Node::int(1)),
                },
                NodeKind::NamedExpr,
            ),
        ];
        for (expr, kind) in cases {
            let tree = Node::module(Node::and(vec![name("a"), expr]));
            assert_eq!(transform(&tree), Err(TransformError::UnsupportedConstruct(kind)));
        }
    }

    #[test]
    fn test_output_is_complete_after_single_pass() {
        let expr = Node::module(Node::or(vec![
            name("a"),
            Node::compare(name("b"), CmpOp::Lt, Node::int(0)),
            Node::compare_chain(
                Node::int(0),
                vec![CmpOp::LtE, CmpOp::LtE],
                vec![name("c"), Node::int(10)],
            ),
            Node::not(Node::compare(name("d"), CmpOp::NotEq, Node::int(1))),
        ]));
        let result = transform(&expr).unwrap();
        assert!(authorize_tree(&result).is_ok());
        assert!(is_fully_rewritten(&result));
    }

    #[test]
    fn test_input_untouched() {
        let expr = Node::and(vec![name("a"), Node::not(name("b"))]);
        let snapshot = expr.clone();
        let _ = transform(&expr).unwrap();
        assert_eq!(expr, snapshot);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TransformError::UnsupportedConstruct(NodeKind::ListComp).to_string(),
            "ListComp node is not supported."
        );
        assert_eq!(
            TransformError::UnsupportedOperator(Operator::Binary(BinOp::BitAnd)).to_string(),
            "Sympy does not support the BitAnd operator, so the transformation is impossible."
        );
    }
}
