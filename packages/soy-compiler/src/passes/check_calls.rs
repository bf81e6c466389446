//! `{call}` target resolution (spec.md §4.5 check-calls).

use crate::ast::{Arena, Node, SoyNodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter};
use crate::node::NodeId;
use crate::resolver::TemplateRegistry;

/// Verifies that every `{call}` in `template_body` names a template that
/// actually exists in `registry`. Delegate calls are checked against *any*
/// registered variant of the name (spec.md §4.4: variant selection is a
/// runtime concern, not a compile-time one).
pub fn check_calls(arena: &Arena, template_body: &[NodeId], registry: &TemplateRegistry, reporter: &mut ErrorReporter) {
    for &id in template_body {
        walk(arena, id, registry, reporter);
    }
}

fn walk(arena: &Arena, id: NodeId, registry: &TemplateRegistry, reporter: &mut ErrorReporter) {
    let record = arena.get(id);
    if let Node::Soy(node) = &record.data {
        match node {
            SoyNodeKind::CallBasic { template_name, .. } => {
                if registry.lookup_basic(&template_name.name).is_none() {
                    reporter.report(Diagnostic::error(
                        template_name.location.clone(),
                        DiagnosticKind::UnknownTemplate,
                        format!("no template named `{}`", template_name.name),
                    ));
                }
            }
            SoyNodeKind::CallDelegate { template_name, .. } => {
                if registry.delegate_variants(&template_name.name).is_empty() {
                    reporter.report(Diagnostic::error(
                        template_name.location.clone(),
                        DiagnosticKind::UnknownTemplate,
                        format!("no deltemplate named `{}`", template_name.name),
                    ));
                }
            }
            _ => {}
        }
    }
    for child in record.data.child_ids() {
        walk(arena, child, registry, reporter);
    }
}
