//! Type Registry (C3, spec.md §4.3, §3.3).
//!
//! Interns every composite [`SoyType`] so that "two equal types compare
//! equal by identity once interned" (spec.md §3.3, invariant 8.1 #2):
//! `TypeId` equality *is* the identity check. Primitive kinds are
//! pre-populated at construction time with fixed ids, so every call site
//! that asks the same registry for `int` gets the same `TypeId`.

mod proto;
mod resolve;

pub use proto::{ProtoDescriptor, ProtoFieldKind, ProtoRegistry};
pub use resolve::resolve_type_node;

use std::collections::HashMap;

use crate::error::{CompilerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Html,
    Attributes,
    Css,
    Uri,
    TrustedResourceUri,
    Js,
    Text,
}

/// Closed set of type shapes (spec.md §3.3). Composite shapes are stored
/// structurally so the interner can deduplicate them; primitives carry no
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeShape {
    Any,
    Unknown,
    Null,
    Bool,
    Int,
    Float,
    Number,
    String,
    Html,
    Attributes,
    Css,
    Uri,
    TrustedResourceUri,
    Js,
    List(TypeId),
    Map(TypeId, TypeId),
    LegacyObjectMap(TypeId, TypeId),
    Record(Vec<RecordField>),
    Union(Vec<TypeId>),
    Proto(String),
    ProtoEnum(String),
    Template(Vec<(String, TypeId)>, TemplateKind),
    Ve(String),
}

pub struct TypeRegistry {
    shapes: Vec<TypeShape>,
    interner: HashMap<TypeShape, TypeId>,
    by_name: HashMap<String, TypeId>,

    // fixed ids for primitives, populated in `new`.
    pub any: TypeId,
    pub unknown: TypeId,
    pub null: TypeId,
    pub bool_: TypeId,
    pub int: TypeId,
    pub float: TypeId,
    pub number: TypeId,
    pub string: TypeId,
    pub html: TypeId,
    pub attributes: TypeId,
    pub css: TypeId,
    pub uri: TypeId,
    pub trusted_resource_uri: TypeId,
    pub js: TypeId,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            shapes: Vec::new(),
            interner: HashMap::new(),
            by_name: HashMap::new(),
            any: TypeId(0),
            unknown: TypeId(0),
            null: TypeId(0),
            bool_: TypeId(0),
            int: TypeId(0),
            float: TypeId(0),
            number: TypeId(0),
            string: TypeId(0),
            html: TypeId(0),
            attributes: TypeId(0),
            css: TypeId(0),
            uri: TypeId(0),
            trusted_resource_uri: TypeId(0),
            js: TypeId(0),
        };

        registry.any = registry.intern(TypeShape::Any);
        registry.unknown = registry.intern(TypeShape::Unknown);
        registry.null = registry.intern(TypeShape::Null);
        registry.bool_ = registry.intern(TypeShape::Bool);
        registry.int = registry.intern(TypeShape::Int);
        registry.float = registry.intern(TypeShape::Float);
        registry.number = registry.intern(TypeShape::Number);
        registry.string = registry.intern(TypeShape::String);
        registry.html = registry.intern(TypeShape::Html);
        registry.attributes = registry.intern(TypeShape::Attributes);
        registry.css = registry.intern(TypeShape::Css);
        registry.uri = registry.intern(TypeShape::Uri);
        registry.trusted_resource_uri = registry.intern(TypeShape::TrustedResourceUri);
        registry.js = registry.intern(TypeShape::Js);

        for (name, id) in [
            ("any", registry.any),
            ("unknown", registry.unknown),
            ("null", registry.null),
            ("bool", registry.bool_),
            ("int", registry.int),
            ("float", registry.float),
            ("number", registry.number),
            ("string", registry.string),
            ("html", registry.html),
            ("attributes", registry.attributes),
            ("css", registry.css),
            ("uri", registry.uri),
            ("trusted_resource_uri", registry.trusted_resource_uri),
            ("js", registry.js),
        ] {
            registry.by_name.insert(name.to_string(), id);
        }

        registry
    }

    fn intern(&mut self, shape: TypeShape) -> TypeId {
        if let Some(id) = self.interner.get(&shape) {
            return *id;
        }
        let id = TypeId(self.shapes.len() as u32);
        self.shapes.push(shape.clone());
        self.interner.insert(shape, id);
        id
    }

    pub fn resolve_by_name(&self, name: &str) -> Result<TypeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CompilerError::UnknownType(name.to_string()))
    }

    pub fn register_named(&mut self, name: impl Into<String>, ty: TypeId) {
        self.by_name.insert(name.into(), ty);
    }

    pub fn list(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeShape::List(elem))
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeShape::Map(key, value))
    }

    pub fn legacy_object_map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeShape::LegacyObjectMap(key, value))
    }

    pub fn record(&mut self, mut fields: Vec<RecordField>) -> TypeId {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        self.intern(TypeShape::Record(fields))
    }

    pub fn proto(&mut self, fqn: impl Into<String>) -> TypeId {
        self.intern(TypeShape::Proto(fqn.into()))
    }

    pub fn proto_enum(&mut self, fqn: impl Into<String>) -> TypeId {
        self.intern(TypeShape::ProtoEnum(fqn.into()))
    }

    pub fn ve(&mut self, fqn: impl Into<String>) -> TypeId {
        self.intern(TypeShape::Ve(fqn.into()))
    }

    pub fn template(&mut self, params: Vec<(String, TypeId)>, kind: TemplateKind) -> TypeId {
        self.intern(TypeShape::Template(params, kind))
    }

    /// `removeNull(T)`: `T \ {null}` (spec.md §3.3).
    pub fn remove_null(&mut self, ty: TypeId) -> TypeId {
        let members = match &self.shapes[ty.0 as usize] {
            TypeShape::Union(members) => members.clone(),
            TypeShape::Null => return self.never_placeholder(),
            _ => return ty,
        };
        let filtered: Vec<TypeId> = members.into_iter().filter(|m| *m != self.null).collect();
        self.build_union(filtered).unwrap_or(ty)
    }

    /// There is no bottom type in the surface language; `removeNull(null)`
    /// collapses to `never`-via-`unknown` is undefined, so we keep `null`
    /// itself rather than invent a type the spec doesn't name. Named
    /// separately to make that choice legible at the call site.
    fn never_placeholder(&self) -> TypeId {
        self.null
    }

    /// `getOrCreateUnion(members)`: flattens nested unions, drops duplicate
    /// members by identity, collapses repeated `null`s, errors if zero
    /// members remain, returns the sole element if one remains (spec.md
    /// §4.3).
    pub fn get_or_create_union(&mut self, members: Vec<TypeId>) -> Result<TypeId> {
        let flat = self.flatten_union_members(members);
        self.build_union(flat)
            .ok_or_else(|| CompilerError::AssertionFailure("union with zero members".into()))
    }

    fn flatten_union_members(&self, members: Vec<TypeId>) -> Vec<TypeId> {
        let mut flat = Vec::new();
        for m in members {
            match &self.shapes[m.0 as usize] {
                TypeShape::Union(inner) => flat.extend(inner.iter().copied()),
                _ => flat.push(m),
            }
        }
        flat
    }

    fn build_union(&mut self, mut flat: Vec<TypeId>) -> Option<TypeId> {
        flat.sort();
        flat.dedup();
        if flat.is_empty() {
            return None;
        }
        if flat.len() == 1 {
            return Some(flat[0]);
        }
        Some(self.intern(TypeShape::Union(flat)))
    }

    pub fn is_union(&self, ty: TypeId) -> Option<&[TypeId]> {
        match &self.shapes[ty.0 as usize] {
            TypeShape::Union(members) => Some(members),
            _ => None,
        }
    }

    pub fn is_nullable(&self, ty: TypeId) -> bool {
        ty == self.null || self.is_union(ty).map_or(false, |m| m.contains(&self.null))
    }

    /// Assignability: `A <- B` iff every value satisfying `B` satisfies `A`.
    /// `unknown` is assignable both ways; `number` accepts int and float;
    /// unions are component-wise (spec.md §3.3).
    pub fn is_assignable(&self, a: TypeId, b: TypeId) -> bool {
        if a == b || a == self.any || a == self.unknown || b == self.unknown {
            return true;
        }
        if a == self.number && (b == self.int || b == self.float) {
            return true;
        }
        if let Some(b_members) = self.is_union(b) {
            return b_members.iter().all(|m| self.is_assignable(a, *m));
        }
        if let Some(a_members) = self.is_union(a) {
            return a_members.iter().any(|m| self.is_assignable(*m, b));
        }
        match (&self.shapes[a.0 as usize], &self.shapes[b.0 as usize]) {
            (TypeShape::List(ea), TypeShape::List(eb)) => self.is_assignable(*ea, *eb),
            (TypeShape::Map(ka, va), TypeShape::Map(kb, vb)) => {
                self.is_assignable(*ka, *kb) && self.is_assignable(*va, *vb)
            }
            _ => false,
        }
    }

    pub fn display(&self, ty: TypeId) -> String {
        match &self.shapes[ty.0 as usize] {
            TypeShape::Any => "any".into(),
            TypeShape::Unknown => "unknown".into(),
            TypeShape::Null => "null".into(),
            TypeShape::Bool => "bool".into(),
            TypeShape::Int => "int".into(),
            TypeShape::Float => "float".into(),
            TypeShape::Number => "number".into(),
            TypeShape::String => "string".into(),
            TypeShape::Html => "html".into(),
            TypeShape::Attributes => "attributes".into(),
            TypeShape::Css => "css".into(),
            TypeShape::Uri => "uri".into(),
            TypeShape::TrustedResourceUri => "trusted_resource_uri".into(),
            TypeShape::Js => "js".into(),
            TypeShape::List(e) => format!("list<{}>", self.display(*e)),
            TypeShape::Map(k, v) => format!("map<{},{}>", self.display(*k), self.display(*v)),
            TypeShape::LegacyObjectMap(k, v) => {
                format!("legacy_object_map<{},{}>", self.display(*k), self.display(*v))
            }
            TypeShape::Record(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}:{}", f.name, self.display(f.ty)))
                    .collect();
                format!("record<{{{}}}>", parts.join(","))
            }
            TypeShape::Union(members) => {
                let parts: Vec<String> = members.iter().map(|m| self.display(*m)).collect();
                parts.join("|")
            }
            TypeShape::Proto(fqn) => format!("proto<{fqn}>"),
            TypeShape::ProtoEnum(fqn) => format!("proto_enum<{fqn}>"),
            TypeShape::Template(_, kind) => format!("template(..)->{kind:?}"),
            TypeShape::Ve(fqn) => format!("ve<{fqn}>"),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}
