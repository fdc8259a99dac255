//! Comparison chain decomposition
//!
//! `a < b <= c` means `a < b and b <= c`. Each link of the chain becomes a
//! pairwise comparison sharing its operand with the next link, and chains of
//! two or more links are joined under a single `And` call.

use crate::ast::{CmpOp, Node, Operator};
use crate::rewrite::{transform, transform_all, TransformError, TransformResult};

/// Rewrite the parts of a `Compare` node
///
/// Every operand is rewritten before any operator is looked at, so an
/// unsupported construct anywhere in the chain is reported ahead of an
/// unsupported operator.
///
/// A chain needs at least one operator and exactly one comparator per
/// operator; anything else is refused as malformed before any rewriting.
pub fn decompose(left: &Node, ops: &[CmpOp], comparators: &[Node]) -> TransformResult<Node> {
    if ops.is_empty() || ops.len() != comparators.len() {
        return Err(TransformError::MalformedCompare {
            ops: ops.len(),
            comparators: comparators.len(),
        });
    }

    let mut operands = Vec::with_capacity(comparators.len() + 1);
    operands.push(transform(left)?);
    operands.extend(transform_all(comparators)?);

    let mut links = ops
        .iter()
        .zip(operands.windows(2))
        .map(|(op, pair)| link(*op, pair[0].clone(), pair[1].clone()))
        .collect::<TransformResult<Vec<_>>>()?;

    if links.len() == 1 {
        Ok(links.remove(0))
    } else {
        Ok(Node::call("And", links))
    }
}

/// Build one pairwise comparison
fn link(op: CmpOp, left: Node, right: Node) -> TransformResult<Node> {
    match op {
        CmpOp::Eq => Ok(Node::call("Eq", vec![left, right])),
        CmpOp::NotEq => Ok(Node::call("Ne", vec![left, right])),
        // The symbolic library overloads the ordering operators directly
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => Ok(Node::compare(left, op, right)),
        CmpOp::Is | CmpOp::IsNot | CmpOp::In | CmpOp::NotIn => {
            Err(TransformError::UnsupportedOperator(Operator::Compare(op)))
        }
    }
}
