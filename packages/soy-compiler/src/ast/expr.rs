//! Expression AST (`ExprNode`, spec.md §3.2, §6.1).
//!
//! Mirrors the teacher's `expression_parser::ast` tagged-enum-plus-struct
//! shape, but every reference to a child expression is a [`NodeId`] into the
//! shared arena rather than an owned/boxed node (spec.md §9 "node graphs
//! with back-references").

use serde::{Deserialize, Serialize};

use crate::node::{ChildIds, Identifier, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprNodeKind {
    NullLiteral,
    BoolLiteral(bool),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    ProtoEnumLiteral { fqn: String, member: String },

    ListLiteral { items: Vec<NodeId> },
    RecordLiteral { fields: Vec<(String, NodeId)> },
    MapLiteral { entries: Vec<(NodeId, NodeId)> },
    /// `[transform(x) for x in list if pred(x)]`.
    ListComprehension {
        item_name: Identifier,
        index_name: Option<Identifier>,
        list_expr: NodeId,
        filter: Option<NodeId>,
        result_expr: NodeId,
    },

    VarRef(Identifier),
    Global(Identifier),

    FieldAccess { base: NodeId, field: Identifier },
    NullSafeFieldAccess { base: NodeId, field: Identifier },
    ItemAccess { base: NodeId, index: NodeId },
    NullSafeItemAccess { base: NodeId, index: NodeId },
    MethodCall { base: NodeId, method: Identifier, args: Vec<NodeId> },
    AssertNonNull { base: NodeId },

    Unary { op: UnaryOp, operand: NodeId },
    Binary { op: BinaryOp, left: NodeId, right: NodeId },
    Ternary { cond: NodeId, then_branch: NodeId, else_branch: NodeId },
    NullCoalesce { left: NodeId, right: NodeId },

    FunctionCall { name: Identifier, args: Vec<NodeId> },
    /// A bare template name used as a value, e.g. `{let $f: .myTemplate /}`.
    TemplateLiteral { name: Identifier },
    ProtoInit { fqn: String, fields: Vec<(String, NodeId)> },
}

impl ExprNodeKind {
    pub fn child_ids(&self) -> ChildIds {
        use ExprNodeKind::*;
        match self {
            NullLiteral
            | BoolLiteral(_)
            | IntLiteral(_)
            | FloatLiteral(_)
            | StringLiteral(_)
            | ProtoEnumLiteral { .. }
            | VarRef(_)
            | Global(_)
            | TemplateLiteral { .. } => ChildIds::new(),
            ListLiteral { items } => items.iter().copied().collect(),
            RecordLiteral { fields } => fields.iter().map(|(_, v)| *v).collect(),
            MapLiteral { entries } => entries.iter().flat_map(|(k, v)| [*k, *v]).collect(),
            ListComprehension {
                list_expr,
                filter,
                result_expr,
                ..
            } => {
                let mut ids: ChildIds = ChildIds::new();
                ids.push(*list_expr);
                if let Some(f) = filter {
                    ids.push(*f);
                }
                ids.push(*result_expr);
                ids
            }
            FieldAccess { base, .. } | NullSafeFieldAccess { base, .. } | AssertNonNull { base } => {
                ChildIds::from_slice(&[*base])
            }
            ItemAccess { base, index } | NullSafeItemAccess { base, index } => {
                ChildIds::from_slice(&[*base, *index])
            }
            MethodCall { base, args, .. } => {
                let mut ids: ChildIds = ChildIds::new();
                ids.push(*base);
                ids.extend(args.iter().copied());
                ids
            }
            Unary { operand, .. } => ChildIds::from_slice(&[*operand]),
            Binary { left, right, .. } | NullCoalesce { left, right } => {
                ChildIds::from_slice(&[*left, *right])
            }
            Ternary {
                cond,
                then_branch,
                else_branch,
            } => ChildIds::from_slice(&[*cond, *then_branch, *else_branch]),
            FunctionCall { args, .. } => args.iter().copied().collect(),
            ProtoInit { fields, .. } => fields.iter().map(|(_, v)| *v).collect(),
        }
    }

    /// Whether this node, taken alone, is a primitive literal that the
    /// optimiser can fold without recursing (spec.md §4.8).
    pub fn is_literal_primitive(&self) -> bool {
        matches!(
            self,
            ExprNodeKind::NullLiteral
                | ExprNodeKind::BoolLiteral(_)
                | ExprNodeKind::IntLiteral(_)
                | ExprNodeKind::FloatLiteral(_)
                | ExprNodeKind::StringLiteral(_)
        )
    }
}
