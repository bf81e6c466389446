//! Backend Interface (C10, spec.md §4.10).
//!
//! The pipeline's output is a stable, read-only snapshot — `CompilerArtefact`
//! — rather than generated code: turning a contextualised, type-checked AST
//! into HTML/JS/Java source is scoped to an external collaborator (spec.md
//! §1, §4.10). What this module owns is giving that collaborator (or a test)
//! a clean way to ask the questions the pipeline already answered: did this
//! compile clean, what does template `ns.foo` look like, what's node `N`.

use crate::ast::Arena;
use crate::autoescape::Inferences;
use crate::diagnostics::{Diagnostic, Severity};
use crate::node::{NodeId, NodeRecord};
use crate::resolver::{RegisteredTemplate, TemplateRegistry};
use crate::types::TypeRegistry;

/// Everything a Compiler::compile() run produced, frozen for read-only
/// consumption. Dropping this drops the arena — a backend that needs to
/// keep working past that point should copy out what it needs.
pub struct CompilerArtefact {
    pub arena: Arena,
    pub file_ids: Vec<NodeId>,
    pub template_registry: TemplateRegistry,
    pub type_registry: TypeRegistry,
    pub diagnostics: Vec<Diagnostic>,
    /// The autoescaper's per-node annotations (spec.md §4.10): escaping
    /// directives assigned to each `{print}`, end contexts and derived
    /// callee names for each `{call}`, and the converged end context of
    /// each template. A backend reads this instead of re-running context
    /// inference itself.
    pub inferences: Inferences,
}

impl CompilerArtefact {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }

    /// Looks up a basic template by its fully qualified `namespace.name`.
    pub fn template(&self, fqn: &str) -> Option<&RegisteredTemplate> {
        self.template_registry.lookup_basic(fqn)
    }

    /// All registered variants of a deltemplate name; empty if none exist.
    pub fn delegate_variants(&self, fqn: &str) -> Vec<&RegisteredTemplate> {
        self.template_registry.delegate_variants(fqn)
    }

    pub fn node(&self, id: NodeId) -> &NodeRecord<crate::ast::Node> {
        self.arena.get(id)
    }

    /// Process exit-code mapping a CLI front-end applies to this artefact
    /// (spec.md §6.3): 0 clean, 1 warnings only, 2 one or more errors.
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            2
        } else if self.has_warnings() {
            1
        } else {
            0
        }
    }
}
