//! Import binding (spec.md §4.4): resolves each file's `{import}` symbols
//! against the namespaces declared by other files in the same compilation,
//! so a bare `Foo` reference in an expression can be traced back to the
//! `.proto` or template namespace it came from.

use std::collections::HashMap;

use crate::ast::{Arena, Node, SoyNodeKind};
use crate::error::{CompilerError, Result};
use crate::node::NodeId;

#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub symbol: String,
    pub from_path: String,
    pub importing_file: NodeId,
}

/// Binds every `{import}` in the file set, keyed by `(file, symbol)` for
/// O(1) lookup during name resolution. Does not itself validate that
/// `from_path` actually exists; that's a `SourceProvider` concern surfaced
/// earlier in the pipeline (spec.md §4.1).
pub fn resolve_imports(arena: &Arena, file_ids: &[NodeId]) -> Result<HashMap<(NodeId, String), ImportBinding>> {
    let mut bindings = HashMap::new();
    for &file_id in file_ids {
        let Node::Soy(SoyNodeKind::File { imports, .. }) = &arena.get(file_id).data else {
            continue;
        };
        for &import_id in imports {
            let Node::Soy(SoyNodeKind::Import { symbols, from_path }) = &arena.get(import_id).data else {
                continue;
            };
            for symbol in symbols {
                let key = (file_id, symbol.name.clone());
                if bindings.contains_key(&key) {
                    return Err(CompilerError::AssertionFailure(format!(
                        "`{}` is imported more than once in the same file",
                        symbol.name
                    )));
                }
                bindings.insert(
                    key,
                    ImportBinding {
                        symbol: symbol.name.clone(),
                        from_path: from_path.clone(),
                        importing_file: file_id,
                    },
                );
            }
        }
    }
    Ok(bindings)
}
