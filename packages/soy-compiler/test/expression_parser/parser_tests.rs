//! Integration coverage for the expression parser's public entry point,
//! exercised through the crate boundary rather than `mod` visibility
//! (spec.md §3.2, §4.2).

#[cfg(test)]
mod tests {
    use soy_compiler::ast::{Arena, BinaryOp, ExprNodeKind, Node};
    use soy_compiler::node::NodeId;
    use soy_compiler::parser::expr::parse_expression;
    use soy_compiler::source::SourceFilePath;

    fn parse(src: &str) -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let id = parse_expression(&mut arena, src, SourceFilePath::new("t.soy"), 1).unwrap();
        (arena, id)
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let (arena, id) = parse("1 + 1 == 2");
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::Binary { op: BinaryOp::Eq, left, .. }) => {
                assert!(matches!(arena.get(*left).data, Node::Expr(ExprNodeKind::Binary { op: BinaryOp::Add, .. })));
            }
            other => panic!("expected a top-level Eq, got {other:?}"),
        }
    }

    #[test]
    fn method_call_chains_off_a_field_access() {
        let (arena, id) = parse("$list.length()");
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::MethodCall { method, args, .. }) => {
                assert_eq!(method.name, "length");
                assert!(args.is_empty());
            }
            other => panic!("expected a method call, got {other:?}"),
        }
    }

    #[test]
    fn non_null_assertion_wraps_its_operand() {
        let (arena, id) = parse("$maybe!");
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::AssertNonNull { .. })));
    }

    #[test]
    fn function_call_collects_every_argument() {
        let (arena, id) = parse("max(1, 2, 3)");
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::FunctionCall { name, args }) => {
                assert_eq!(name.name, "max");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected a function call, got {other:?}"),
        }
    }

    #[test]
    fn map_literal_parses_expression_keyed_entries() {
        let (arena, id) = parse(r#"map("a": 1, "b": 2)"#);
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::MapLiteral { entries }) => assert_eq!(entries.len(), 2),
            other => panic!("expected a map literal, got {other:?}"),
        }
    }
}
