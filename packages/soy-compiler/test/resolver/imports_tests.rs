//! Import-binding coverage beyond `resolve_imports`'s inline test
//! (spec.md §4.4): duplicate imports within one file, and two files
//! independently importing the same symbol name without colliding.

#[cfg(test)]
mod tests {
    use soy_compiler::ast::Arena;
    use soy_compiler::diagnostics::ErrorReporter;
    use soy_compiler::parser::soy::parse_file;
    use soy_compiler::resolver::resolve_imports;
    use soy_compiler::source::SourceFilePath;

    fn parse(path: &str, src: &str, arena: &mut Arena) -> soy_compiler::node::NodeId {
        let mut reporter = ErrorReporter::new();
        parse_file(arena, &mut reporter, SourceFilePath::new(path), src)
    }

    #[test]
    fn importing_the_same_symbol_twice_in_one_file_is_an_error() {
        let mut arena = Arena::new();
        let file = parse(
            "a.soy",
            r#"{namespace ns}
            {import Foo from "other.soy"}
            {import Foo from "other.soy"}
            {template .t}
              hi
            {/template}
            "#,
            &mut arena,
        );
        assert!(resolve_imports(&arena, &[file]).is_err());
    }

    #[test]
    fn two_files_can_independently_import_the_same_symbol_name() {
        let mut arena = Arena::new();
        let a = parse(
            "a.soy",
            r#"{namespace ns.a}
            {import Shared from "shared.soy"}
            {template .t}
              hi
            {/template}
            "#,
            &mut arena,
        );
        let b = parse(
            "b.soy",
            r#"{namespace ns.b}
            {import Shared from "shared.soy"}
            {template .t}
              hi
            {/template}
            "#,
            &mut arena,
        );
        let bindings = resolve_imports(&arena, &[a, b]).unwrap();
        assert_eq!(bindings[&(a, "Shared".to_string())].from_path, "shared.soy");
        assert_eq!(bindings[&(b, "Shared".to_string())].from_path, "shared.soy");
    }

    #[test]
    fn a_file_with_no_imports_yields_no_bindings() {
        let mut arena = Arena::new();
        let file = parse(
            "a.soy",
            r#"{namespace ns}
            {template .t}
              hi
            {/template}
            "#,
            &mut arena,
        );
        let bindings = resolve_imports(&arena, &[file]).unwrap();
        assert!(bindings.is_empty());
    }
}
