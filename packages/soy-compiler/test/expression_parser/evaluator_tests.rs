//! End-to-end coverage of parse → evaluate for the expression language
//! (spec.md §4.7), exercised through the crate's public surface.

#[cfg(test)]
mod tests {
    use soy_compiler::eval::{Environment, Evaluator, Value};
    use soy_compiler::parser::expr::parse_expression;
    use soy_compiler::source::SourceFilePath;
    use soy_compiler::ast::Arena;

    fn eval(src: &str, env: &Environment) -> Value {
        let mut arena = Arena::new();
        let id = parse_expression(&mut arena, src, SourceFilePath::new("t.soy"), 1).unwrap();
        Evaluator::new(&arena).eval(id, env).unwrap()
    }

    #[test]
    fn evaluates_arithmetic_with_operator_precedence() {
        assert_eq!(eval("2 + 3 * 4", &Environment::new()), Value::Int(14));
    }

    #[test]
    fn ternary_picks_the_taken_branch_only() {
        assert_eq!(eval("1 < 2 ? \"yes\" : \"no\"", &Environment::new()), Value::Str("yes".into()));
    }

    #[test]
    fn record_literal_fields_are_independently_evaluated() {
        match eval("[a: 1 + 1, b: \"x\"]", &Environment::new()) {
            Value::Record(fields) => {
                assert_eq!(fields, vec![("a".to_string(), Value::Int(2)), ("b".to_string(), Value::Str("x".into()))]);
            }
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[test]
    fn bound_variables_resolve_through_the_environment() {
        let mut env = Environment::new();
        env.bind("name", Value::Str("Ada".into()));
        assert_eq!(eval("$name", &env), Value::Str("Ada".into()));
    }

    #[test]
    fn string_concatenation_via_plus() {
        assert_eq!(eval("\"foo\" + \"bar\"", &Environment::new()), Value::Str("foobar".into()));
    }

    #[test]
    fn length_builtin_counts_list_items() {
        assert_eq!(eval("length([1, 2, 3])", &Environment::new()), Value::Int(3));
    }
}
