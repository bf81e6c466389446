//! `Inferences` (spec.md §4.10, §6.2, GLOSSARY): the per-node annotations
//! the autoescaper records as it walks a template body — the escaping
//! directives assigned to each `{print}`, the end context recorded for
//! each `{call}`, the derived-callee name recorded when a non-strict
//! callee gets contextualised for a particular caller context, and the
//! converged end context of each template. A backend reads this instead
//! of re-running context inference itself.

use std::collections::HashMap;

use crate::autoescape::context::Context;
use crate::autoescape::directives::EscapeDirective;
use crate::node::NodeId;

#[derive(Debug, Clone, Default)]
pub struct Inferences {
    print_directives: HashMap<NodeId, Vec<EscapeDirective>>,
    call_end_contexts: HashMap<NodeId, Context>,
    derived_callee_names: HashMap<NodeId, String>,
    template_end_contexts: HashMap<NodeId, Context>,
}

impl Inferences {
    pub fn new() -> Self {
        Inferences::default()
    }

    pub fn record_print(&mut self, print_node: NodeId, directives: Vec<EscapeDirective>) {
        self.print_directives.insert(print_node, directives);
    }

    pub fn directives_of(&self, print_node: NodeId) -> Option<&[EscapeDirective]> {
        self.print_directives.get(&print_node).map(|v| v.as_slice())
    }

    pub fn record_call_end_context(&mut self, call_node: NodeId, ctx: Context) {
        self.call_end_contexts.insert(call_node, ctx);
    }

    pub fn call_end_context(&self, call_node: NodeId) -> Option<Context> {
        self.call_end_contexts.get(&call_node).copied()
    }

    pub fn record_derived_callee(&mut self, call_node: NodeId, derived_name: String) {
        self.derived_callee_names.insert(call_node, derived_name);
    }

    pub fn derived_callee(&self, call_node: NodeId) -> Option<&str> {
        self.derived_callee_names.get(&call_node).map(|s| s.as_str())
    }

    pub fn record_template_end_context(&mut self, template_node: NodeId, ctx: Context) {
        self.template_end_contexts.insert(template_node, ctx);
    }

    pub fn template_end_context(&self, template_node: NodeId) -> Option<Context> {
        self.template_end_contexts.get(&template_node).copied()
    }
}
