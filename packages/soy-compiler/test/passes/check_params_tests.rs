//! Integration coverage for `check_template_params` beyond its inline
//! tests (spec.md §4.6), driven through real parsed template bodies.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use soy_compiler::ast::{Arena, Node, SoyNodeKind};
    use soy_compiler::diagnostics::ErrorReporter;
    use soy_compiler::parser::soy::parse_file;
    use soy_compiler::passes::check_template_params;
    use soy_compiler::source::SourceFilePath;

    fn check(src: &str) -> ErrorReporter {
        let mut arena = Arena::new();
        let mut parse_reporter = ErrorReporter::new();
        let file = parse_file(&mut arena, &mut parse_reporter, SourceFilePath::new("t.soy"), src);
        let templates = match &arena.get(file).data {
            Node::Soy(SoyNodeKind::File { templates, .. }) => templates.clone(),
            other => panic!("expected a file, got {other:?}"),
        };
        let (declared, body) = match &arena.get(templates[0]).data {
            Node::Soy(SoyNodeKind::Template(data)) => {
                let declared: HashSet<String> = data
                    .params
                    .iter()
                    .filter_map(|&id| match &arena.get(id).data {
                        Node::Soy(SoyNodeKind::Param { name, .. }) => Some(name.name.clone()),
                        _ => None,
                    })
                    .collect();
                (declared, data.body.clone())
            }
            other => panic!("expected a template, got {other:?}"),
        };
        let mut reporter = ErrorReporter::new();
        check_template_params(&arena, &body, &declared, &mut reporter);
        reporter
    }

    #[test]
    fn a_declared_param_referenced_in_the_body_is_accepted() {
        let reporter = check(
            r#"{namespace ns}
            {template .t}
              {@param name: string}
              Hello, {$name}!
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
    }

    #[test]
    fn a_for_loop_variable_goes_out_of_scope_after_the_loop() {
        let reporter = check(
            r#"{namespace ns}
            {template .t}
              {@param items: list<string>}
              {for $item in $items}
                {$item}
              {/for}
              {$item}
            {/template}
            "#,
        );
        assert!(reporter.has_errors());
    }

    #[test]
    fn an_undeclared_variable_in_an_if_branch_is_still_caught() {
        let reporter = check(
            r#"{namespace ns}
            {template .t}
              {@param x: int}
              {if $x > 0}
                {$y}
              {/if}
            {/template}
            "#,
        );
        assert!(reporter.has_errors());
    }
}
