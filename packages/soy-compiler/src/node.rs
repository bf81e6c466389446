//! Node identity, source locations, and the per-file-set arena.
//!
//! Resolves the "node graphs with back-references" redesign note (spec.md
//! §9 / SPEC_FULL.md §3.7): every AST node lives in one arena keyed by
//! [`NodeId`]; parent links and cross-references (call → callee, var-ref →
//! declaration) are stored as ids, never as owning or borrowed pointers.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::source::SourceFilePath;

/// (path, start line, start col, end line, end col); `UNKNOWN` sentinel
/// allowed (spec.md §3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: SourceFilePath,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceLocation {
    pub fn new(path: SourceFilePath, start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        SourceLocation {
            path,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// The `UNKNOWN` sentinel location.
    pub fn unknown() -> Self {
        SourceLocation {
            path: SourceFilePath::new("<unknown>"),
            start_line: 0,
            start_col: 0,
            end_line: 0,
            end_col: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.path.as_str() == "<unknown>"
    }
}

/// Stable sort key for spec.md §5's diagnostic ordering guarantee:
/// `(path, start-offset-ish, node-id)` — we approximate the byte offset with
/// `(start_line, start_col)` since the arena doesn't retain raw offsets.
impl SourceLocation {
    pub fn sort_key(&self) -> (&str, u32, u32) {
        (self.path.as_str(), self.start_line, self.start_col)
    }
}

/// `(string, location)`; equality is by string only (spec.md §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub location: SourceLocation,
}

impl Identifier {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Identifier {
            name: name.into(),
            location,
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Identifier {}

impl std::hash::Hash for Identifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Monotonic id, unique within one file set (spec.md §3.2, invariant 8.1 #1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Allocates node ids from a single counter, as spec.md §5 requires
/// ("a single monotonically increasing counter, accessed only from the
/// pipeline-owning thread; clones take a batch of ids atomically").
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { next: 0 }
    }

    pub fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Reserve `count` contiguous ids in one step, for subtree cloning
    /// during autoescaper derivation.
    pub fn alloc_batch(&mut self, count: u32) -> std::ops::Range<u32> {
        let start = self.next;
        self.next += count;
        start..self.next
    }
}

/// Generic record held by the arena: location plus the concrete payload.
/// `parent` is `None` only for the FileSet root.
#[derive(Debug, Clone)]
pub struct NodeRecord<T> {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub location: SourceLocation,
    pub data: T,
}

/// A child-id list small enough to avoid heap allocation for the common
/// case (a handful of children) while still supporting arbitrarily large
/// template bodies.
pub type ChildIds = SmallVec<[NodeId; 4]>;

/// Invariant 8.1 #1: verifies that every node in `records` is reachable from
/// its parent's computed child list exactly once. `children_of` computes a
/// node's children from its own payload (see `ast::soy::SoyNodeKind::child_ids`
/// and friends) rather than caching a second, possibly-stale copy.
pub fn assert_arena_integrity<T>(
    records: &[NodeRecord<T>],
    children_of: impl Fn(&T) -> ChildIds,
) -> std::result::Result<(), String> {
    use std::collections::HashMap;
    let mut seen_ids = HashMap::new();
    for r in records {
        if seen_ids.insert(r.id, ()).is_some() {
            return Err(format!("duplicate node id {:?}", r.id));
        }
    }
    for r in records {
        let kids = children_of(&r.data);
        for kid in &kids {
            let kid_record = records
                .iter()
                .find(|rec| rec.id == *kid)
                .ok_or_else(|| format!("{:?} references missing child {:?}", r.id, kid))?;
            if kid_record.parent != Some(r.id) {
                return Err(format!(
                    "{:?} claims child {:?} but child's parent is {:?}",
                    r.id, kid, kid_record.parent
                ));
            }
        }
    }
    Ok(())
}
