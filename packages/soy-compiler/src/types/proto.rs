//! Proto descriptor registry (spec.md §4.3).
//!
//! Proto descriptor *loading* (reading `.proto` / `FileDescriptorSet` bytes
//! off disk) is an external collaborator per spec.md §1 ("only the shape of
//! the descriptor service is specified"); this module only specifies that
//! shape: FQN → message/enum, plus an extension multimap keyed by the
//! extended message's FQN.

use std::collections::HashMap;

use crate::error::{CompilerError, Result};
use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoFieldKind {
    Scalar,
    Message,
    Enum,
    Repeated,
}

#[derive(Debug, Clone)]
pub struct ProtoField {
    pub name: String,
    pub kind: ProtoFieldKind,
    pub type_ref: TypeId,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct ProtoDescriptor {
    pub fqn: String,
    pub fields: Vec<ProtoField>,
    pub source_path: String,
}

#[derive(Debug, Default)]
pub struct ProtoRegistry {
    messages: HashMap<String, ProtoDescriptor>,
    enums: HashMap<String, ProtoDescriptor>,
    /// Extension multimap: containing message FQN -> extension field FQNs.
    extensions: HashMap<String, Vec<String>>,
}

impl ProtoRegistry {
    pub fn new() -> Self {
        ProtoRegistry::default()
    }

    pub fn register_message(&mut self, descriptor: ProtoDescriptor) -> Result<()> {
        if let Some(existing) = self.messages.get(&descriptor.fqn) {
            if existing.source_path != descriptor.source_path {
                return Err(CompilerError::ProtoCollision {
                    fqn: descriptor.fqn.clone(),
                    path_a: existing.source_path.clone(),
                    path_b: descriptor.source_path.clone(),
                });
            }
        }
        self.messages.insert(descriptor.fqn.clone(), descriptor);
        Ok(())
    }

    pub fn register_enum(&mut self, descriptor: ProtoDescriptor) -> Result<()> {
        if let Some(existing) = self.enums.get(&descriptor.fqn) {
            if existing.source_path != descriptor.source_path {
                return Err(CompilerError::ProtoCollision {
                    fqn: descriptor.fqn.clone(),
                    path_a: existing.source_path.clone(),
                    path_b: descriptor.source_path.clone(),
                });
            }
        }
        self.enums.insert(descriptor.fqn.clone(), descriptor);
        Ok(())
    }

    pub fn register_extension(&mut self, containing_message_fqn: &str, extension_fqn: &str) {
        self.extensions
            .entry(containing_message_fqn.to_string())
            .or_default()
            .push(extension_fqn.to_string());
    }

    pub fn message(&self, fqn: &str) -> Result<&ProtoDescriptor> {
        self.messages
            .get(fqn)
            .ok_or_else(|| CompilerError::UnknownType(fqn.to_string()))
    }

    pub fn enum_(&self, fqn: &str) -> Result<&ProtoDescriptor> {
        self.enums
            .get(fqn)
            .ok_or_else(|| CompilerError::UnknownType(fqn.to_string()))
    }

    /// `getExtension(protoFqn)` requires the extension's containing message
    /// to match the base's FQN (spec.md §4.7).
    pub fn extensions_of(&self, containing_message_fqn: &str) -> &[String] {
        self.extensions
            .get(containing_message_fqn)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(fqn: &str, path: &str) -> ProtoDescriptor {
        ProtoDescriptor {
            fqn: fqn.to_string(),
            fields: vec![],
            source_path: path.to_string(),
        }
    }

    #[test]
    fn registering_the_same_message_from_the_same_file_is_fine() {
        let mut registry = ProtoRegistry::new();
        registry.register_message(descriptor("pkg.Foo", "a.proto")).unwrap();
        registry.register_message(descriptor("pkg.Foo", "a.proto")).unwrap();
    }

    #[test]
    fn two_distinct_files_declaring_the_same_fqn_collide() {
        let mut registry = ProtoRegistry::new();
        registry.register_message(descriptor("pkg.Foo", "a.proto")).unwrap();
        let err = registry.register_message(descriptor("pkg.Foo", "b.proto")).unwrap_err();
        assert!(matches!(err, CompilerError::ProtoCollision { .. }));
    }

    #[test]
    fn extensions_are_keyed_by_containing_message() {
        let mut registry = ProtoRegistry::new();
        registry.register_extension("pkg.Base", "pkg.ext_field");
        assert_eq!(registry.extensions_of("pkg.Base"), ["pkg.ext_field".to_string()]);
        assert!(registry.extensions_of("pkg.Other").is_empty());
    }
}
