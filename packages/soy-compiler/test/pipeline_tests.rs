//! End-to-end `Compiler::compile` coverage beyond its inline tests
//! (spec.md §4, §5, §6.3), exercising multi-file compilation, deltemplates,
//! and exit-code mapping.

#[cfg(test)]
mod tests {
    use soy_compiler::source::InMemorySourceProvider;
    use soy_compiler::Compiler;

    #[test]
    fn a_clean_multi_file_compile_registers_every_template_and_exits_zero() {
        let provider = InMemorySourceProvider::new()
            .with_file(
                "lib.soy",
                r#"{namespace my.lib}
                {template .widget}
                  {@param label: string}
                  <span>{$label}</span>
                {/template}
                "#,
            )
            .with_file(
                "page.soy",
                r#"{namespace my.page}
                {import Widget from "lib.soy"}
                {template .main kind="html"}
                  <div>{call my.lib.widget}{param label: "hi" /}{/call}</div>
                {/template}
                "#,
            );
        let artefact = Compiler::new(&provider).compile();
        assert!(!artefact.has_errors(), "{:?}", artefact.diagnostics);
        assert!(artefact.template("my.lib.widget").is_some());
        assert!(artefact.template("my.page.main").is_some());
        assert_eq!(artefact.exit_code(), 0);
    }

    #[test]
    fn duplicate_template_names_in_the_same_namespace_are_reported_and_exit_nonzero() {
        let provider = InMemorySourceProvider::new().with_file(
            "a.soy",
            r#"{namespace my.ns}
            {template .t}
              one
            {/template}

            {template .t}
              two
            {/template}
            "#,
        );
        let artefact = Compiler::new(&provider).compile();
        assert!(artefact.has_errors());
        assert_eq!(artefact.exit_code(), 2);
    }

    #[test]
    fn distinct_deltemplate_variants_both_register_under_the_same_name() {
        let provider = InMemorySourceProvider::new().with_file(
            "a.soy",
            r#"{namespace my.ns}
            {deltemplate my.ns.slot variant="1"}
              one
            {/deltemplate}

            {deltemplate my.ns.slot variant="2"}
              two
            {/deltemplate}
            "#,
        );
        let artefact = Compiler::new(&provider).compile();
        assert!(!artefact.has_errors(), "{:?}", artefact.diagnostics);
        assert_eq!(artefact.delegate_variants("my.ns.slot").len(), 2);
    }

    #[test]
    fn a_cross_kind_strict_call_is_caught_by_autoescaping() {
        let provider = InMemorySourceProvider::new().with_file(
            "a.soy",
            r#"{namespace my.ns}
            {template .caller kind="html"}
              {call .callee /}
            {/template}

            {template .callee kind="css"}
              .x {lb} color: red; {rb}
            {/template}
            "#,
        );
        let artefact = Compiler::new(&provider).compile();
        assert!(artefact.has_errors());
    }
}
