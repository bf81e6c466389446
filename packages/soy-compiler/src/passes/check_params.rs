//! Template parameter checking (spec.md §4.6): every `$var` referenced in a
//! template body must be a declared `@param`, `@inject`, or loop/`{let}`
//! local, and typos get a Levenshtein "did you mean" hint.

use std::collections::HashSet;

use crate::ast::{Arena, ExprNodeKind, Node, SoyNodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter};
use crate::node::NodeId;

/// Checks that every `VarRef` under `body` resolves to a name in
/// `declared` (template params + state vars, seeded by the caller) or one
/// introduced locally by a `{let}`/`{for}` the walk passes through.
pub fn check_template_params(arena: &Arena, body: &[NodeId], declared: &HashSet<String>, reporter: &mut ErrorReporter) {
    let mut scope = declared.clone();
    for &id in body {
        walk(arena, id, &mut scope, declared, reporter);
    }
}

fn walk(arena: &Arena, id: NodeId, scope: &mut HashSet<String>, declared_globally: &HashSet<String>, reporter: &mut ErrorReporter) {
    let record = arena.get(id);
    let mut locally_introduced = None;
    match &record.data {
        Node::Soy(SoyNodeKind::Let { name, .. }) => {
            locally_introduced = Some(name.name.clone());
        }
        Node::Soy(SoyNodeKind::For { var_name, .. }) => {
            locally_introduced = Some(var_name.name.clone());
        }
        Node::Expr(ExprNodeKind::VarRef(name)) => {
            if !scope.contains(&name.name) {
                let mut diag = Diagnostic::error(
                    name.location.clone(),
                    DiagnosticKind::UndeclaredDataKey,
                    format!("Unknown data key '{}'", name.name),
                );
                if let Some(suggestion) = closest_match(&name.name, declared_globally) {
                    diag = diag.with_hint(format!("Did you mean '{suggestion}'?"));
                }
                reporter.report(diag);
            }
        }
        _ => {}
    }

    if let Some(name) = &locally_introduced {
        scope.insert(name.clone());
    }
    for child in record.data.child_ids() {
        walk(arena, child, scope, declared_globally, reporter);
    }
    if let Some(name) = &locally_introduced {
        scope.remove(name);
    }
}

fn closest_match<'a>(target: &str, candidates: &'a HashSet<String>) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (c.as_str(), levenshtein(target, c)))
        .filter(|(_, dist)| *dist <= 2)
        .min_by_key(|(_, dist)| *dist)
        .map(|(c, _)| c)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = cur;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Identifier, SourceLocation};

    #[test]
    fn flags_a_reference_to_an_undeclared_param() {
        let mut arena = Arena::new();
        let var = arena.alloc(
            None,
            SourceLocation::unknown(),
            Node::Expr(ExprNodeKind::VarRef(Identifier::new("naem", SourceLocation::unknown()))),
        );
        let mut declared = HashSet::new();
        declared.insert("name".to_string());
        let mut reporter = ErrorReporter::new();
        check_template_params(&arena, &[var], &declared, &mut reporter);
        assert!(reporter.has_errors());
        assert!(reporter.diagnostics()[0].message.contains("Unknown data key 'naem'"));
        assert_eq!(reporter.diagnostics()[0].hint.as_deref(), Some("Did you mean 'name'?"));
    }

    #[test]
    fn a_let_bound_local_is_in_scope_for_the_rest_of_the_body() {
        let mut arena = Arena::new();
        let var = arena.alloc(
            None,
            SourceLocation::unknown(),
            Node::Expr(ExprNodeKind::VarRef(Identifier::new("x", SourceLocation::unknown()))),
        );
        let let_node = arena.alloc(
            None,
            SourceLocation::unknown(),
            Node::Soy(SoyNodeKind::Let {
                name: Identifier::new("x", SourceLocation::unknown()),
                value: None,
                content: vec![var],
                kind: None,
            }),
        );
        let declared = HashSet::new();
        let mut reporter = ErrorReporter::new();
        check_template_params(&arena, &[let_node], &declared, &mut reporter);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn levenshtein_distance_matches_known_values() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("name", "naem"), 2);
    }
}
