//! Top-level pipeline orchestrator (spec.md §4, §5): owns the one `Arena`,
//! drives every pass through `PassKind::ORDER`, and hands back a
//! [`CompilerArtefact`] a backend or test can read without re-walking passes.
//!
//! A pass with errors blocks every pass after it, but whatever diagnostics
//! earlier passes already reported stay in the result (spec.md §4.5).

use std::collections::HashSet;

use crate::ast::{Arena, Node, SoyNodeKind, TemplateData};
use crate::autoescape::Inferences;
use crate::backend::CompilerArtefact;
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter};
use crate::eval::Environment;
use crate::node::NodeId;
use crate::optimizer::simplify;
use crate::parser::parse_file;
use crate::passes::{check_calls, check_mixed_param_styles, check_non_empty_msg, check_template_params, PassKind, PassManager};
use crate::resolver::{register_file_templates, resolve_imports, TemplateRegistry};
use crate::source::SourceProvider;
use crate::types::{resolve_type_node, TypeRegistry};

pub struct Compiler<'p> {
    provider: &'p dyn SourceProvider,
}

impl<'p> Compiler<'p> {
    pub fn new(provider: &'p dyn SourceProvider) -> Self {
        Compiler { provider }
    }

    pub fn compile(&self) -> CompilerArtefact {
        let mut arena = Arena::new();
        let mut reporter = ErrorReporter::new();
        let mut template_registry = TemplateRegistry::new();
        let mut type_registry = TypeRegistry::new();
        let mut file_ids: Vec<NodeId> = Vec::new();
        let mut inferences = Inferences::new();

        {
            let mut manager = PassManager::new(&mut reporter);
            let mut ok = true;

            ok = ok
                && manager.run(PassKind::Parse, |reporter| {
                    for path in self.provider.paths() {
                        let Ok(source) = self.provider.get(&path) else {
                            continue;
                        };
                        file_ids.push(parse_file(&mut arena, reporter, path, &source));
                    }
                });

            ok = ok
                && manager.run(PassKind::Imports, |reporter| {
                    for &file_id in &file_ids {
                        if let Err(e) = register_file_templates(&arena, file_id, &mut template_registry) {
                            reporter.report(Diagnostic::error(
                                arena.location_of(file_id).clone(),
                                DiagnosticKind::DuplicateTemplate,
                                e.to_string(),
                            ));
                        }
                    }
                    if let Err(e) = resolve_imports(&arena, &file_ids) {
                        reporter.report(Diagnostic::error(
                            crate::node::SourceLocation::unknown(),
                            DiagnosticKind::AssertionFailure,
                            e.to_string(),
                        ));
                    }
                });

            ok = ok
                && manager.run(PassKind::Types, |reporter| {
                    for_each_template(&arena, &file_ids, |_fqn, data, _template_id| {
                        for &param_id in &data.params {
                            let Node::Soy(SoyNodeKind::Param { ty_node: Some(ty_id), .. }) = &arena.get(param_id).data else {
                                continue;
                            };
                            if let Err(e) = resolve_type_node(&arena, &mut type_registry, *ty_id) {
                                reporter.report(Diagnostic::error(arena.location_of(*ty_id).clone(), DiagnosticKind::UnknownType, e.to_string()));
                            }
                        }
                    });
                });

            // NameResolution: template names were already bound into
            // `template_registry` during Imports; this stage is a no-op kept
            // only so `PassKind::ORDER` still names every stage spec.md §4.5
            // lists. Variable-name resolution happens in CheckParams below.
            ok = ok && manager.run(PassKind::NameResolution, |_reporter| {});

            ok = ok
                && manager.run(PassKind::CheckCalls, |reporter| {
                    for_each_template(&arena, &file_ids, |_fqn, data, _id| {
                        check_calls(&arena, &data.body, &template_registry, reporter);
                    });
                });

            ok = ok
                && manager.run(PassKind::CheckParams, |reporter| {
                    for_each_template(&arena, &file_ids, |_fqn, data, _id| {
                        let declared = declared_names(&arena, data);
                        check_template_params(&arena, &data.body, &declared, reporter);
                    });
                });

            ok = ok
                && manager.run(PassKind::Conformance, |reporter| {
                    for_each_template(&arena, &file_ids, |_fqn, _data, template_id| {
                        check_non_empty_msg(&arena, template_id, reporter);
                        check_mixed_param_styles(&arena, template_id, reporter);
                    });
                });

            ok = ok
                && manager.run(PassKind::Optimise, |_reporter| {
                    let env = Environment::new();
                    let mut template_ids = Vec::new();
                    for_each_template(&arena, &file_ids, |_fqn, _data, id| template_ids.push(id));
                    // Constant-folds to a fixed point; each template is independent so a
                    // stuck subtree in one can't stall the rest (spec.md §4.8).
                    for id in template_ids {
                        let mut budget = 64;
                        while budget > 0 && simplify(&mut arena, id, &env) {
                            budget -= 1;
                        }
                    }
                });

            ok = ok
                && manager.run(PassKind::Autoescape, |reporter| {
                    run_autoescape(&arena, &file_ids, &template_registry, reporter, &mut inferences);
                });

            // DesugarHtml: the parser already emits flat, structural
            // `HtmlOpenTag`/`HtmlCloseTag`/`HtmlAttribute` nodes, so there is no
            // separate lowering to do here — the pass exists to keep
            // `PassKind::ORDER` naming the same stages spec.md §4.5 lists.
            ok = ok && manager.run(PassKind::DesugarHtml, |_reporter| {});

            // FinalLowering: codegen itself is an external collaborator's
            // concern (spec.md §1, §4.10); this pipeline's final product is the
            // read-only `CompilerArtefact` `compile()` returns below.
            let _ = ok && manager.run(PassKind::FinalLowering, |_reporter| {});
        }

        CompilerArtefact {
            arena,
            file_ids,
            template_registry,
            type_registry,
            diagnostics: reporter.into_diagnostics(),
            inferences,
        }
    }
}

fn for_each_template(arena: &Arena, file_ids: &[NodeId], mut f: impl FnMut(&str, &TemplateData, NodeId)) {
    for &file_id in file_ids {
        let Node::Soy(SoyNodeKind::File { namespace, templates, .. }) = &arena.get(file_id).data else {
            continue;
        };
        for &template_id in templates {
            if let Node::Soy(SoyNodeKind::Template(data)) = &arena.get(template_id).data {
                let fqn = format!("{namespace}.{}", data.name.name);
                f(&fqn, data, template_id);
            }
        }
    }
}

fn declared_names(arena: &Arena, data: &TemplateData) -> HashSet<String> {
    let mut declared = HashSet::new();
    for &param_id in data.params.iter().chain(data.state_vars.iter()) {
        if let Node::Soy(SoyNodeKind::Param { name, .. }) = &arena.get(param_id).data {
            declared.insert(name.name.clone());
        }
    }
    declared
}

/// Runs the contextual analyzer over every strict or contextual template in
/// the file set, starting each from the context implied by its `kind`
/// attribute, or `HTML_PCDATA` for a `contextual` template with no declared
/// kind (spec.md §4.9 "strict block start/end contexts"). A `{call}` inside
/// a contextual template still runs the full caller-mode decision table —
/// only `deprecated-noncontextual` templates are left unchecked, since they
/// opt out of static contextualisation entirely by design.
fn run_autoescape(arena: &Arena, file_ids: &[NodeId], registry: &TemplateRegistry, reporter: &mut ErrorReporter, inferences: &mut Inferences) {
    use crate::ast::AutoescapeMode;
    use crate::autoescape::{Context, ContextualAnalyzer};

    for_each_template(arena, file_ids, |_fqn, data, template_id| {
        if data.autoescape == AutoescapeMode::DeprecatedNoncontextual {
            return;
        }
        let entry = Context::start_context_for(data.content_kind.unwrap_or(crate::ast::ContentKind::Html));
        let mut analyzer = ContextualAnalyzer::new(arena, registry, reporter, inferences);
        let _ = analyzer.infer_template(template_id, entry);
    });
}

/// Evaluates a `print`-position expression against an environment that has
/// no template params bound, for contexts (CLI smoke tests, the optimiser)
/// that only need literal-folding, not full rendering.
pub fn eval_literal(arena: &Arena, expr_id: NodeId) -> crate::error::Result<crate::eval::Value> {
    crate::eval::Evaluator::new(arena).eval(expr_id, &Environment::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySourceProvider;

    #[test]
    fn compiles_a_simple_file_with_no_diagnostics() {
        let provider = InMemorySourceProvider::new().with_file(
            "greet.soy",
            r#"{namespace my.ns}

            {template .greet}
              {@param name: string}
              <div>Hello, {$name}!</div>
            {/template}
            "#,
        );
        let compiler = Compiler::new(&provider);
        let artefact = compiler.compile();
        assert!(!artefact.has_errors(), "{:?}", artefact.diagnostics);
        assert!(artefact.template("my.ns.greet").is_some());
    }

    #[test]
    fn unknown_call_target_is_reported() {
        let provider = InMemorySourceProvider::new().with_file(
            "a.soy",
            r#"{namespace my.ns}
            {template .caller}
              {call .missing /}
            {/template}
            "#,
        );
        let compiler = Compiler::new(&provider);
        let artefact = compiler.compile();
        assert!(artefact.has_errors());
    }

    #[test]
    fn undeclared_variable_reference_is_reported() {
        let provider = InMemorySourceProvider::new().with_file(
            "a.soy",
            r#"{namespace my.ns}
            {template .t}
              {$bogus}
            {/template}
            "#,
        );
        let compiler = Compiler::new(&provider);
        let artefact = compiler.compile();
        assert!(artefact.has_errors());
    }
}
