//! Constant-folding optimiser (C8, spec.md §4.8).
//!
//! Walks an expression subtree bottom-up, folding any node whose children
//! are all literals down to a single literal node via the same
//! [`crate::eval::Evaluator`] the runtime would use — "what the optimiser
//! folds at compile time and what the runtime computes at run time must
//! agree" (spec.md §4.8 invariant). Folding never fails the compile: an
//! evaluation error (e.g. division by zero) just means the node is left
//! unfolded for the runtime to report.

use crate::ast::{Arena, ExprNodeKind, Node};
use crate::eval::{Environment, Evaluator, Value};
use crate::node::NodeId;

/// Recursively folds `id` and its descendants in place, returning whether
/// `id` itself ended up a literal after folding.
pub fn simplify(arena: &mut Arena, id: NodeId, env: &Environment) -> bool {
    let child_ids: Vec<NodeId> = arena.children_of(id).to_vec();
    let mut all_children_literal = true;
    for child in &child_ids {
        if !is_expr_node(arena, *child) {
            continue;
        }
        if !simplify(arena, *child, env) {
            all_children_literal = false;
        }
    }

    let Some(kind) = arena.get(id).data.as_expr().cloned() else {
        return false;
    };

    if kind.is_literal_primitive() {
        return true;
    }

    if !all_children_literal && !is_short_circuitable(&kind) {
        return false;
    }

    let evaluator = Evaluator::new(arena);
    match evaluator.eval(id, env) {
        Ok(value) => {
            if let Some(folded) = value_to_literal(&value) {
                arena.get_mut(id).data = Node::Expr(folded);
                true
            } else {
                false
            }
        }
        Err(_) => false,
    }
}

fn is_expr_node(arena: &Arena, id: NodeId) -> bool {
    arena.get(id).data.as_expr().is_some()
}

/// `and`/`or` can fold from just the left operand (spec.md §4.8: short
/// circuit applies at fold time, not only at run time), so they're allowed
/// through even when the right child didn't itself reduce to a literal.
fn is_short_circuitable(kind: &ExprNodeKind) -> bool {
    matches!(
        kind,
        ExprNodeKind::Binary {
            op: crate::ast::BinaryOp::And | crate::ast::BinaryOp::Or,
            ..
        }
    )
}

fn value_to_literal(value: &Value) -> Option<ExprNodeKind> {
    match value {
        Value::Null => Some(ExprNodeKind::NullLiteral),
        Value::Bool(b) => Some(ExprNodeKind::BoolLiteral(*b)),
        Value::Int(i) => Some(ExprNodeKind::IntLiteral(*i)),
        Value::Float(f) => Some(ExprNodeKind::FloatLiteral(*f)),
        Value::Str(s) => Some(ExprNodeKind::StringLiteral(s.clone())),
        // Lists/records/maps/protos fold their element expressions in place
        // already (each child was simplified before we got here); the
        // composite literal node itself stays a `ListLiteral`/etc, it just
        // now points at folded children, so there's nothing further to
        // rewrite at this level.
        _ => None,
    }
}
