//! Visitor pattern for read-only traversal of expression trees

use super::nodes::{Comprehension, Constant, Keyword, Node};

/// Visitor trait for tree traversal
///
/// Every method defaults to walking into the children, so an implementation
/// only overrides the hooks it cares about and calls the matching `walk_*`
/// function to keep descending.
pub trait Visitor: Sized {
    /// Visit any node
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    /// Visit a keyword argument
    fn visit_keyword(&mut self, keyword: &Keyword) {
        walk_keyword(self, keyword);
    }

    /// Visit a comprehension clause
    fn visit_comprehension(&mut self, comprehension: &Comprehension) {
        walk_comprehension(self, comprehension);
    }

    /// Visit a literal
    fn visit_constant(&mut self, _value: &Constant) {
        // Leaf node, no children
    }

    /// Visit an identifier
    fn visit_name(&mut self, _id: &str) {
        // Leaf node, no children
    }
}

/// Walk the children of a node, top-down and left to right
pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Module(inner) | Node::Expr(inner) | Node::Starred(inner) => {
            visitor.visit_node(inner);
        }

        Node::BoolOp { values, .. } => {
            for value in values {
                visitor.visit_node(value);
            }
        }

        Node::BinOp { left, right, .. } => {
            visitor.visit_node(left);
            visitor.visit_node(right);
        }

        Node::UnaryOp { operand, .. } => {
            visitor.visit_node(operand);
        }

        Node::Compare { left, comparators, .. } => {
            visitor.visit_node(left);
            for comparator in comparators {
                visitor.visit_node(comparator);
            }
        }

        Node::Call { func, args, keywords } => {
            visitor.visit_node(func);
            for arg in args {
                visitor.visit_node(arg);
            }
            for keyword in keywords {
                visitor.visit_keyword(keyword);
            }
        }

        Node::Constant(value) => {
            visitor.visit_constant(value);
        }

        Node::Name(id) => {
            visitor.visit_name(id);
        }

        Node::Attribute { value, .. } | Node::NamedExpr { value, .. } => {
            visitor.visit_node(value);
        }

        Node::Subscript { value, slice } => {
            visitor.visit_node(value);
            visitor.visit_node(slice);
        }

        Node::List(elts) | Node::Tuple(elts) | Node::Set(elts) => {
            for elt in elts {
                visitor.visit_node(elt);
            }
        }

        Node::Dict(entries) => {
            for (key, value) in entries {
                visitor.visit_node(key);
                visitor.visit_node(value);
            }
        }

        Node::ListComp { elt, generators } | Node::GeneratorExp { elt, generators } => {
            visitor.visit_node(elt);
            for generator in generators {
                visitor.visit_comprehension(generator);
            }
        }

        Node::IfExp { test, body, orelse } => {
            visitor.visit_node(test);
            visitor.visit_node(body);
            visitor.visit_node(orelse);
        }

        Node::Lambda { body, .. } => {
            visitor.visit_node(body);
        }
    }
}

/// Walk a keyword argument
pub fn walk_keyword<V: Visitor>(visitor: &mut V, keyword: &Keyword) {
    visitor.visit_node(&keyword.value);
}

/// Walk a comprehension clause
pub fn walk_comprehension<V: Visitor>(visitor: &mut V, comprehension: &Comprehension) {
    visitor.visit_node(&comprehension.target);
    visitor.visit_node(&comprehension.iter);
    for condition in &comprehension.ifs {
        visitor.visit_node(condition);
    }
}
