//! Type annotation surface syntax (`TypeNode`, spec.md §3.2).
//!
//! Unresolved as written by the user; a later pass turns this into an
//! interned [`crate::types::TypeId`] via [`crate::types::TypeRegistry`].

use serde::{Deserialize, Serialize};

use crate::node::{ChildIds, NodeId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeNodeKind {
    /// A bare name: `string`, `int`, `pkg.MyProto`, `?string` is represented
    /// as a `Union` with a `Named("null")` member by the parser.
    Named(String),
    /// `list<T>`, `map<K,V>`, `legacy_object_map<K,V>`.
    Generic { name: String, args: Vec<NodeId> },
    Record(Vec<(String, NodeId)>),
    Union(Vec<NodeId>),
}

impl TypeNodeKind {
    pub fn child_ids(&self) -> ChildIds {
        match self {
            TypeNodeKind::Named(_) => ChildIds::new(),
            TypeNodeKind::Generic { args, .. } => args.iter().copied().collect(),
            TypeNodeKind::Record(fields) => fields.iter().map(|(_, t)| *t).collect(),
            TypeNodeKind::Union(members) => members.iter().copied().collect(),
        }
    }
}
