//! `simplify` coverage beyond its inline unit tests (spec.md §4.8),
//! exercised through parsed expressions rather than hand-built arenas.

#[cfg(test)]
mod tests {
    use soy_compiler::ast::{Arena, ExprNodeKind, Node};
    use soy_compiler::eval::Environment;
    use soy_compiler::optimizer::simplify;
    use soy_compiler::parser::expr::parse_expression;
    use soy_compiler::source::SourceFilePath;

    fn fold(src: &str) -> (Arena, soy_compiler::node::NodeId, bool) {
        let mut arena = Arena::new();
        let id = parse_expression(&mut arena, src, SourceFilePath::new("t.soy"), 1).unwrap();
        let folded = simplify(&mut arena, id, &Environment::new());
        (arena, id, folded)
    }

    #[test]
    fn folds_string_concatenation() {
        let (arena, id, folded) = fold("\"a\" + \"b\" + \"c\"");
        assert!(folded);
        assert!(matches!(&arena.get(id).data, Node::Expr(ExprNodeKind::StringLiteral(s)) if s == "abc"));
    }

    #[test]
    fn folds_a_ternary_whose_condition_is_constant() {
        let (arena, id, folded) = fold("true ? 1 : 2");
        assert!(folded);
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::IntLiteral(1))));
    }

    #[test]
    fn modulo_by_zero_is_left_unfolded_for_the_runtime_to_report() {
        let (arena, id, folded) = fold("1 % 0");
        assert!(!folded);
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::Binary { .. })));
    }

    #[test]
    fn and_short_circuits_to_false_without_needing_the_right_operand_bound() {
        let (arena, id, folded) = fold("false and $undeclared");
        assert!(folded);
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::BoolLiteral(false))));
    }

    #[test]
    fn list_literal_elements_fold_in_place_but_the_list_node_itself_stays() {
        let (arena, id, folded) = fold("[1 + 1, 2 + 2]");
        assert!(!folded);
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::ListLiteral { items }) => {
                assert!(matches!(arena.get(items[0]).data, Node::Expr(ExprNodeKind::IntLiteral(2))));
                assert!(matches!(arena.get(items[1]).data, Node::Expr(ExprNodeKind::IntLiteral(4))));
            }
            other => panic!("expected a list literal, got {other:?}"),
        }
    }
}
