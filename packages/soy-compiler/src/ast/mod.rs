//! The shared AST arena (spec.md §3.2, §9 "node graphs with back-references").
//!
//! `SoyNode`, `ExprNode`, and `TypeNode` are three distinct *surface*
//! families, but they share one [`NodeId`] space and one arena: a call's
//! argument is an `ExprNode`, a param's annotation is a `TypeNode`, and both
//! are reached from a `SoyNode` by id. Keeping them in one `Vec` means a
//! single allocator and a single integrity check cover the whole tree.

pub mod expr;
pub mod soy;
pub mod ty;

use crate::node::{assert_arena_integrity, ChildIds, IdAllocator, NodeId, NodeRecord, SourceLocation};

pub use expr::{BinaryOp, ExprNodeKind, UnaryOp};
pub use soy::{AutoescapeMode, ContentKind, QuoteStyle, SoyNodeKind, TemplateData, TemplateDeclKind, TemplateVisibility};
pub use ty::TypeNodeKind;

#[derive(Debug, Clone)]
pub enum Node {
    Soy(SoyNodeKind),
    Expr(ExprNodeKind),
    Type(TypeNodeKind),
}

impl Node {
    pub fn child_ids(&self) -> ChildIds {
        match self {
            Node::Soy(n) => n.child_ids(),
            Node::Expr(n) => n.child_ids(),
            Node::Type(n) => n.child_ids(),
        }
    }

    pub fn as_soy(&self) -> Option<&SoyNodeKind> {
        match self {
            Node::Soy(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&ExprNodeKind> {
        match self {
            Node::Expr(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeNodeKind> {
        match self {
            Node::Type(n) => Some(n),
            _ => None,
        }
    }
}

/// The single per-file-set arena: one [`IdAllocator`] plus a dense vector of
/// records indexed by [`NodeId`]. Every pass after parsing operates on an
/// `Arena` rather than owning its own tree.
#[derive(Debug, Default)]
pub struct Arena {
    allocator: IdAllocator,
    records: Vec<NodeRecord<Node>>,
}

impl Arena {
    pub fn new() -> Self {
        Arena {
            allocator: IdAllocator::new(),
            records: Vec::new(),
        }
    }

    /// Allocates a fresh id and stores `node` under it. `parent` must already
    /// be present in the arena (or `None` for the file-set root).
    pub fn alloc(&mut self, parent: Option<NodeId>, location: SourceLocation, node: Node) -> NodeId {
        let id = self.allocator.alloc();
        debug_assert_eq!(id.0 as usize, self.records.len(), "Arena::alloc must be called in id order");
        self.records.push(NodeRecord {
            id,
            parent,
            location,
            data: node,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeRecord<Node> {
        &self.records[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeRecord<Node> {
        &mut self.records[id.0 as usize]
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn location_of(&self, id: NodeId) -> &SourceLocation {
        &self.get(id).location
    }

    /// Children of `id`, computed fresh from its payload rather than cached
    /// (spec.md §9: avoid a second, possibly-stale copy of the tree shape).
    pub fn children_of(&self, id: NodeId) -> ChildIds {
        self.get(id).data.child_ids()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        assert_arena_integrity(&self.records, |data| data.child_ids())
    }
}
