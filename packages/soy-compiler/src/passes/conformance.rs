//! Conformance-style semantic passes (spec.md §4.6): non-empty `{msg}`
//! bodies, and templates that declare params using both the legacy
//! `@param`-bag style and explicit calls within the same `{call}` (spec.md
//! §4.6 "mixed param styles" warning).

use crate::ast::{Arena, Node, SoyNodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter};
use crate::node::NodeId;

/// `{msg desc="..."}{/msg}` with an empty body is almost always a mistake
/// (nothing for translators to translate); flagged as a warning, not an
/// error, since it's syntactically valid.
pub fn check_non_empty_msg(arena: &Arena, id: NodeId, reporter: &mut ErrorReporter) {
    if let Node::Soy(SoyNodeKind::Msg { body, .. }) = &arena.get(id).data {
        if body.is_empty() {
            reporter.report(Diagnostic::warning(
                arena.location_of(id).clone(),
                DiagnosticKind::EmptyMsg,
                "{msg} has an empty body",
            ));
        }
    }
    for child in arena.get(id).data.child_ids() {
        check_non_empty_msg(arena, child, reporter);
    }
}

/// A `{call}` that both sets `data="all"` and passes an explicit
/// `{param}` is legal (explicit params override the forwarded record) but
/// easy to misread; spec.md §4.6 asks for a warning so authors notice.
pub fn check_mixed_param_styles(arena: &Arena, id: NodeId, reporter: &mut ErrorReporter) {
    let record = arena.get(id);
    let flagged = match &record.data {
        Node::Soy(SoyNodeKind::CallBasic { data_all, params, .. }) => *data_all && !params.is_empty(),
        Node::Soy(SoyNodeKind::CallDelegate { data_all, params, .. }) => *data_all && !params.is_empty(),
        _ => false,
    };
    if flagged {
        reporter.report(Diagnostic::warning(
            record.location.clone(),
            DiagnosticKind::MixedParamStyles,
            "`data=\"all\"` combined with explicit {param} tags; explicit params win",
        ));
    }
    for child in record.data.child_ids() {
        check_mixed_param_styles(arena, child, reporter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Identifier, SourceLocation};

    #[test]
    fn empty_msg_body_warns() {
        let mut arena = Arena::new();
        let msg = arena.alloc(
            None,
            SourceLocation::unknown(),
            Node::Soy(SoyNodeKind::Msg {
                desc: Some("d".into()),
                body: vec![],
                fallback: None,
            }),
        );
        let mut reporter = ErrorReporter::new();
        check_non_empty_msg(&arena, msg, &mut reporter);
        assert!(!reporter.has_errors());
        assert_eq!(reporter.diagnostics().len(), 1);
    }

    #[test]
    fn data_all_with_explicit_param_warns() {
        let mut arena = Arena::new();
        let value = arena.alloc(None, SourceLocation::unknown(), Node::Expr(crate::ast::ExprNodeKind::NullLiteral));
        let param = arena.alloc(
            None,
            SourceLocation::unknown(),
            Node::Soy(SoyNodeKind::CallParamValue {
                name: Identifier::new("x", SourceLocation::unknown()),
                value,
            }),
        );
        let call = arena.alloc(
            None,
            SourceLocation::unknown(),
            Node::Soy(SoyNodeKind::CallBasic {
                template_name: Identifier::new("ns.t", SourceLocation::unknown()),
                data_all: true,
                params: vec![param],
            }),
        );
        let mut reporter = ErrorReporter::new();
        check_mixed_param_styles(&arena, call, &mut reporter);
        assert_eq!(reporter.diagnostics().len(), 1);
    }
}
