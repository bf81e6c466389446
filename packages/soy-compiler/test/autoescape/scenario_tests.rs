//! End-to-end `ContextualAnalyzer` scenarios over real parsed templates
//! (spec.md §4.9), complementing `derive.rs`'s hand-built-arena unit tests.

#[cfg(test)]
mod tests {
    use soy_compiler::ast::{Arena, ContentKind, Node, SoyNodeKind};
    use soy_compiler::autoescape::{Context, ContextualAnalyzer, Inferences};
    use soy_compiler::diagnostics::ErrorReporter;
    use soy_compiler::parser::soy::parse_file;
    use soy_compiler::resolver::{register_file_templates, TemplateRegistry};
    use soy_compiler::source::SourceFilePath;

    fn template_node(arena: &Arena, file: soy_compiler::node::NodeId, index: usize) -> soy_compiler::node::NodeId {
        match &arena.get(file).data {
            Node::Soy(SoyNodeKind::File { templates, .. }) => templates[index],
            other => panic!("expected a file, got {other:?}"),
        }
    }

    #[test]
    fn a_plain_html_template_converges_to_the_pcdata_context() {
        let mut arena = Arena::new();
        let mut parse_reporter = ErrorReporter::new();
        let file = parse_file(
            &mut arena,
            &mut parse_reporter,
            SourceFilePath::new("t.soy"),
            r#"{namespace ns}
            {template .t kind="html"}
              <div>hello</div>
            {/template}
            "#,
        );
        assert!(!parse_reporter.has_errors());
        let registry = TemplateRegistry::new();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let tmpl = template_node(&arena, file, 0);
        let ctx = analyzer.infer_template(tmpl, Context::HTML_PCDATA).unwrap();
        assert_eq!(ctx, Context::HTML_PCDATA);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn calling_a_strict_html_callee_from_html_context_converges_cleanly() {
        let mut arena = Arena::new();
        let mut parse_reporter = ErrorReporter::new();
        let file = parse_file(
            &mut arena,
            &mut parse_reporter,
            SourceFilePath::new("t.soy"),
            r#"{namespace ns}
            {template .caller kind="html"}
              <div>{call .callee /}</div>
            {/template}

            {template .callee kind="html"}
              <span>hi</span>
            {/template}
            "#,
        );
        assert!(!parse_reporter.has_errors());
        let mut registry = TemplateRegistry::new();
        register_file_templates(&arena, file, &mut registry).unwrap();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let caller = template_node(&arena, file, 0);
        let ctx = analyzer.infer_template(caller, Context::HTML_PCDATA).unwrap();
        assert!(!ctx.is_error());
        assert!(!reporter.has_errors());
    }

    #[test]
    fn calling_a_css_callee_from_html_context_is_a_mismatch() {
        let mut arena = Arena::new();
        let mut parse_reporter = ErrorReporter::new();
        let file = parse_file(
            &mut arena,
            &mut parse_reporter,
            SourceFilePath::new("t.soy"),
            r#"{namespace ns}
            {template .caller kind="html"}
              {call .callee /}
            {/template}

            {template .callee kind="css"}
              .x { color: red; }
            {/template}
            "#,
        );
        assert!(!parse_reporter.has_errors());
        let mut registry = TemplateRegistry::new();
        register_file_templates(&arena, file, &mut registry).unwrap();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let caller = template_node(&arena, file, 0);
        let ctx = analyzer.infer_template(caller, Context::HTML_PCDATA).unwrap();
        assert!(ctx.is_error());
    }

    #[test]
    fn a_recursive_template_that_preserves_context_converges() {
        let mut arena = Arena::new();
        let mut parse_reporter = ErrorReporter::new();
        let file = parse_file(
            &mut arena,
            &mut parse_reporter,
            SourceFilePath::new("t.soy"),
            r#"{namespace ns}
            {template .loop kind="html"}
              {@param n: int}
              {if $n > 0}
                <i>{call .loop}{param n: $n - 1 /}{/call}</i>
              {/if}
            {/template}
            "#,
        );
        assert!(!parse_reporter.has_errors());
        let mut registry = TemplateRegistry::new();
        register_file_templates(&arena, file, &mut registry).unwrap();
        let mut reporter = ErrorReporter::new();
        let mut inferences = Inferences::new();
        let mut analyzer = ContextualAnalyzer::new(&arena, &registry, &mut reporter, &mut inferences);
        let tmpl = template_node(&arena, file, 0);
        let ctx = analyzer.infer_template(tmpl, Context::HTML_PCDATA).unwrap();
        assert!(!ctx.is_error());
    }

    #[test]
    fn start_context_for_content_kind_matches_the_template_declared_kind() {
        assert_eq!(Context::start_context_for(ContentKind::Html), Context::HTML_PCDATA);
    }
}
