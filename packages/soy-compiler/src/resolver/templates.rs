//! The cross-file template registry (spec.md §4.4).

use std::collections::HashMap;

use crate::ast::{TemplateData, TemplateDeclKind};
use crate::error::{CompilerError, Result};
use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// `namespace.templateName`.
    Basic(String),
    /// Deltemplate name + variant; the empty string is the default variant.
    Delegate(String, String),
}

#[derive(Debug, Clone)]
pub struct RegisteredTemplate {
    pub key: TemplateKey,
    pub node_id: NodeId,
    pub fqn: String,
}

#[derive(Debug, Default)]
pub struct TemplateRegistry {
    entries: HashMap<TemplateKey, RegisteredTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        TemplateRegistry::default()
    }

    pub fn register(&mut self, namespace: &str, data: &TemplateData, node_id: NodeId) -> Result<()> {
        let fqn = format!("{namespace}.{}", data.name.name);
        let key = match data.decl_kind {
            TemplateDeclKind::Delegate => TemplateKey::Delegate(
                fqn.clone(),
                data.delegate_variant.clone().unwrap_or_default(),
            ),
            TemplateDeclKind::Basic | TemplateDeclKind::Element => TemplateKey::Basic(fqn.clone()),
        };
        if self.entries.contains_key(&key) {
            return Err(CompilerError::DuplicateTemplate(fqn));
        }
        self.entries.insert(key.clone(), RegisteredTemplate { key, node_id, fqn });
        Ok(())
    }

    pub fn lookup_basic(&self, fqn: &str) -> Option<&RegisteredTemplate> {
        self.entries.get(&TemplateKey::Basic(fqn.to_string()))
    }

    /// All variants of a deltemplate name, for the runtime/backend's variant
    /// dispatch (spec.md §4.4; variant *selection* itself is an external
    /// collaborator's concern per spec.md §1).
    pub fn delegate_variants(&self, name: &str) -> Vec<&RegisteredTemplate> {
        self.entries
            .values()
            .filter(|t| matches!(&t.key, TemplateKey::Delegate(n, _) if n == name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AutoescapeMode, TemplateVisibility};
    use crate::node::{Identifier, SourceLocation};

    fn template(name: &str, kind: TemplateDeclKind, variant: Option<&str>) -> TemplateData {
        TemplateData {
            name: Identifier::new(name, SourceLocation::unknown()),
            decl_kind: kind,
            content_kind: None,
            autoescape: AutoescapeMode::Strict,
            params: vec![],
            state_vars: vec![],
            strict_html: true,
            visibility: TemplateVisibility::Public,
            require_css: vec![],
            delegate_package: None,
            delegate_variant: variant.map(|s| s.to_string()),
            body: vec![],
        }
    }

    #[test]
    fn registers_and_looks_up_a_basic_template() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("ns", &template("greet", TemplateDeclKind::Basic, None), NodeId(0))
            .unwrap();
        assert!(registry.lookup_basic("ns.greet").is_some());
    }

    #[test]
    fn duplicate_basic_template_name_errors() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("ns", &template("greet", TemplateDeclKind::Basic, None), NodeId(0))
            .unwrap();
        let err = registry
            .register("ns", &template("greet", TemplateDeclKind::Basic, None), NodeId(1))
            .unwrap_err();
        assert!(matches!(err, CompilerError::DuplicateTemplate(_)));
    }

    #[test]
    fn distinct_deltemplate_variants_coexist() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("ns", &template("card", TemplateDeclKind::Delegate, Some("a")), NodeId(0))
            .unwrap();
        registry
            .register("ns", &template("card", TemplateDeclKind::Delegate, Some("b")), NodeId(1))
            .unwrap();
        assert_eq!(registry.delegate_variants("ns.card").len(), 2);
    }
}
