//! Symbol & Import Resolver (C4, spec.md §4.4).
//!
//! Builds the cross-file template registry (basic templates keyed by fully
//! qualified name, deltemplates keyed by name+variant) and binds each
//! file's `{import}` statements to the namespace they reference, so later
//! passes can answer "what does `.foo` call?" without re-walking every file.

mod imports;
mod templates;

pub use imports::{resolve_imports, ImportBinding};
pub use templates::{RegisteredTemplate, TemplateKey, TemplateRegistry};

use crate::ast::{Arena, Node, SoyNodeKind};
use crate::error::Result;
use crate::node::NodeId;

/// Walks one file's templates and registers each one, surfacing duplicate
/// declarations as `Err` (spec.md §4.4 invariant: "no two templates share a
/// fully qualified name").
pub fn register_file_templates(
    arena: &Arena,
    file_id: NodeId,
    registry: &mut TemplateRegistry,
) -> Result<()> {
    let Node::Soy(SoyNodeKind::File { namespace, templates, .. }) = &arena.get(file_id).data else {
        return Ok(());
    };
    for &template_id in templates {
        if let Node::Soy(SoyNodeKind::Template(data)) = &arena.get(template_id).data {
            registry.register(namespace, data, template_id)?;
        }
    }
    Ok(())
}
