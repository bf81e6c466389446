//! Resolves surface [`crate::ast::TypeNodeKind`] annotations into interned
//! [`TypeId`]s (spec.md §4.3 "type resolution pass", run once per file set
//! after parsing and before name resolution needs param types).

use crate::ast::{Arena, Node, TypeNodeKind};
use crate::error::{CompilerError, Result};
use crate::node::NodeId;
use crate::types::{TemplateKind, TypeId, TypeRegistry};

pub fn resolve_type_node(arena: &Arena, registry: &mut TypeRegistry, id: NodeId) -> Result<TypeId> {
    let node = match &arena.get(id).data {
        Node::Type(t) => t,
        other => {
            return Err(CompilerError::AssertionFailure(format!(
                "resolve_type_node() called on a non-type node {:?}",
                other
            )))
        }
    };
    match node {
        TypeNodeKind::Named(name) => resolve_named(registry, name),
        TypeNodeKind::Generic { name, args } => resolve_generic(arena, registry, name, args),
        TypeNodeKind::Record(fields) => {
            let mut resolved = Vec::with_capacity(fields.len());
            for (name, ty_id) in fields {
                let ty = resolve_type_node(arena, registry, *ty_id)?;
                resolved.push(crate::types::RecordField { name: name.clone(), ty });
            }
            Ok(registry.record(resolved))
        }
        TypeNodeKind::Union(members) => {
            let resolved = members
                .iter()
                .map(|m| resolve_type_node(arena, registry, *m))
                .collect::<Result<Vec<_>>>()?;
            registry.get_or_create_union(resolved)
        }
    }
}

fn resolve_named(registry: &mut TypeRegistry, name: &str) -> Result<TypeId> {
    if let Ok(id) = registry.resolve_by_name(name) {
        return Ok(id);
    }
    // A dotted name not already registered as a primitive/alias is a proto
    // message reference; `--` / enum distinction is decided by the proto
    // registry at symbol-resolution time (spec.md §4.3), so we speculatively
    // intern it as a message type here and let later passes downgrade it to
    // `ProtoEnum` if the descriptor says otherwise.
    if name.contains('.') {
        return Ok(registry.proto(name));
    }
    Err(CompilerError::UnknownType(name.to_string()))
}

fn resolve_generic(arena: &Arena, registry: &mut TypeRegistry, name: &str, args: &[NodeId]) -> Result<TypeId> {
    match name {
        "list" => {
            let elem = resolve_type_node(arena, registry, *args.first().ok_or_else(|| {
                CompilerError::AssertionFailure("list<> requires one type argument".into())
            })?)?;
            Ok(registry.list(elem))
        }
        "map" => {
            let (Some(&k), Some(&v)) = (args.first(), args.get(1)) else {
                return Err(CompilerError::AssertionFailure("map<> requires two type arguments".into()));
            };
            let key = resolve_type_node(arena, registry, k)?;
            let value = resolve_type_node(arena, registry, v)?;
            Ok(registry.map(key, value))
        }
        "legacy_object_map" => {
            let (Some(&k), Some(&v)) = (args.first(), args.get(1)) else {
                return Err(CompilerError::AssertionFailure(
                    "legacy_object_map<> requires two type arguments".into(),
                ));
            };
            let key = resolve_type_node(arena, registry, k)?;
            let value = resolve_type_node(arena, registry, v)?;
            Ok(registry.legacy_object_map(key, value))
        }
        "template" => Ok(registry.template(vec![], TemplateKind::Html)),
        other => Err(CompilerError::UnknownType(format!("{other}<...>"))),
    }
}
