//! Recursive-descent expression parser (spec.md §4.1, §6.1), grounded in
//! the teacher's `expression_parser::parser` precedence-climbing shape but
//! rebuilt around [`crate::ast::ExprNodeKind`] and the shared [`Arena`]
//! rather than a standalone boxed AST.

use crate::ast::{Arena, BinaryOp, ExprNodeKind, Node, UnaryOp};
use crate::error::{CompilerError, Result};
use crate::lexer::expr::{tokenize, Token, TokenType};
use crate::node::{Identifier, NodeId, SourceLocation};

pub struct ExprParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    arena: &'a mut Arena,
    path: crate::source::SourceFilePath,
    line: u32,
}

impl<'a> ExprParser<'a> {
    pub fn new(arena: &'a mut Arena, source: &str, path: crate::source::SourceFilePath, line: u32) -> Self {
        ExprParser {
            tokens: tokenize(source),
            pos: 0,
            arena,
            path,
            line,
        }
    }

    fn loc(&self, tok: &Token) -> SourceLocation {
        SourceLocation::new(self.path.clone(), self.line, tok.start as u32, self.line, tok.end as u32)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_operator(&mut self, op: &str) -> Result<()> {
        if self.peek().is_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(CompilerError::AssertionFailure(format!(
                "expected `{op}`, found `{}`",
                self.peek().str_value
            )))
        }
    }

    pub fn parse(&mut self) -> Result<NodeId> {
        let id = self.parse_ternary()?;
        if !self.peek().is_eof() {
            return Err(CompilerError::AssertionFailure(format!(
                "unexpected trailing input `{}`",
                self.peek().str_value
            )));
        }
        Ok(id)
    }

    /// Allocates `kind` and back-fills its children's `parent` pointers,
    /// since children are always allocated before the node that refers to
    /// them in this bottom-up recursive descent (spec.md §9 arena invariant).
    fn alloc(&mut self, loc: SourceLocation, kind: ExprNodeKind) -> NodeId {
        let id = self.arena.alloc(None, loc, Node::Expr(kind));
        for child in self.arena.children_of(id) {
            self.arena.get_mut(child).parent = Some(id);
        }
        id
    }

    fn parse_ternary(&mut self) -> Result<NodeId> {
        let cond = self.parse_null_coalesce()?;
        if self.peek().is_operator("?") {
            let tok = self.advance();
            let then_branch = self.parse_ternary()?;
            self.expect_operator(":")?;
            let else_branch = self.parse_ternary()?;
            return Ok(self.alloc(
                self.loc(&tok),
                ExprNodeKind::Ternary {
                    cond,
                    then_branch,
                    else_branch,
                },
            ));
        }
        Ok(cond)
    }

    fn parse_null_coalesce(&mut self) -> Result<NodeId> {
        let mut left = self.parse_or()?;
        while self.peek().is_operator("??") {
            let tok = self.advance();
            let right = self.parse_or()?;
            left = self.alloc(self.loc(&tok), ExprNodeKind::NullCoalesce { left, right });
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<NodeId> {
        let mut left = self.parse_and()?;
        while self.peek().is_keyword("or") || self.peek().is_operator("||") {
            let tok = self.advance();
            let right = self.parse_and()?;
            left = self.alloc(
                self.loc(&tok),
                ExprNodeKind::Binary {
                    op: BinaryOp::Or,
                    left,
                    right,
                },
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<NodeId> {
        let mut left = self.parse_equality()?;
        while self.peek().is_keyword("and") || self.peek().is_operator("&&") {
            let tok = self.advance();
            let right = self.parse_equality()?;
            left = self.alloc(
                self.loc(&tok),
                ExprNodeKind::Binary {
                    op: BinaryOp::And,
                    left,
                    right,
                },
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<NodeId> {
        let mut left = self.parse_relational()?;
        loop {
            let op = if self.peek().is_operator("==") {
                BinaryOp::Eq
            } else if self.peek().is_operator("!=") {
                BinaryOp::Ne
            } else {
                break;
            };
            let tok = self.advance();
            let right = self.parse_relational()?;
            left = self.alloc(self.loc(&tok), ExprNodeKind::Binary { op, left, right });
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<NodeId> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.peek().is_operator("<=") {
                BinaryOp::Le
            } else if self.peek().is_operator(">=") {
                BinaryOp::Ge
            } else if self.peek().is_operator("<") {
                BinaryOp::Lt
            } else if self.peek().is_operator(">") {
                BinaryOp::Gt
            } else {
                break;
            };
            let tok = self.advance();
            let right = self.parse_additive()?;
            left = self.alloc(self.loc(&tok), ExprNodeKind::Binary { op, left, right });
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<NodeId> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.peek().is_operator("+") {
                BinaryOp::Add
            } else if self.peek().is_operator("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            let tok = self.advance();
            let right = self.parse_multiplicative()?;
            left = self.alloc(self.loc(&tok), ExprNodeKind::Binary { op, left, right });
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.peek().is_operator("*") {
                BinaryOp::Mul
            } else if self.peek().is_operator("/") {
                BinaryOp::Div
            } else if self.peek().is_operator("%") {
                BinaryOp::Mod
            } else {
                break;
            };
            let tok = self.advance();
            let right = self.parse_unary()?;
            left = self.alloc(self.loc(&tok), ExprNodeKind::Binary { op, left, right });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        if self.peek().is_operator("-") {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(self.loc(&tok), ExprNodeKind::Unary { op: UnaryOp::Neg, operand }));
        }
        if self.peek().is_keyword("not") || self.peek().is_operator("!") {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(self.loc(&tok), ExprNodeKind::Unary { op: UnaryOp::Not, operand }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<NodeId> {
        let mut base = self.parse_primary()?;
        loop {
            if self.peek().is_operator(".") {
                let tok = self.advance();
                let name = self.expect_identifier()?;
                let name_loc = self.loc(&tok);
                if self.peek().is_operator("(") {
                    self.advance();
                    let args = self.parse_call_args()?;
                    base = self.alloc(
                        name_loc.clone(),
                        ExprNodeKind::MethodCall {
                            base,
                            method: Identifier::new(name, name_loc),
                            args,
                        },
                    );
                } else {
                    base = self.alloc(
                        name_loc.clone(),
                        ExprNodeKind::FieldAccess {
                            base,
                            field: Identifier::new(name, name_loc),
                        },
                    );
                }
            } else if self.peek().is_operator("?.") {
                let tok = self.advance();
                let field = self.expect_identifier()?;
                base = self.alloc(
                    self.loc(&tok),
                    ExprNodeKind::NullSafeFieldAccess {
                        base,
                        field: Identifier::new(field, self.loc(&tok)),
                    },
                );
            } else if self.peek().is_operator("[") {
                let tok = self.advance();
                let index = self.parse_ternary()?;
                self.expect_operator("]")?;
                base = self.alloc(self.loc(&tok), ExprNodeKind::ItemAccess { base, index });
            } else if self.peek().is_operator("?[") {
                let tok = self.advance();
                let index = self.parse_ternary()?;
                self.expect_operator("]")?;
                base = self.alloc(self.loc(&tok), ExprNodeKind::NullSafeItemAccess { base, index });
            } else if self.peek().is_operator("!") {
                let tok = self.advance();
                base = self.alloc(self.loc(&tok), ExprNodeKind::AssertNonNull { base });
            } else {
                break;
            }
        }
        Ok(base)
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let tok = self.peek().clone();
        if tok.token_type == TokenType::Identifier {
            self.advance();
            Ok(tok.str_value)
        } else {
            Err(CompilerError::AssertionFailure(format!("expected an identifier, found `{}`", tok.str_value)))
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        let tok = self.peek().clone();
        match tok.token_type {
            TokenType::Number => {
                self.advance();
                let loc = self.loc(&tok);
                if tok.str_value.contains('.') || tok.str_value.contains(['e', 'E']) {
                    Ok(self.alloc(loc, ExprNodeKind::FloatLiteral(tok.num_value)))
                } else {
                    Ok(self.alloc(loc, ExprNodeKind::IntLiteral(tok.num_value as i64)))
                }
            }
            TokenType::String => {
                self.advance();
                let loc = self.loc(&tok);
                Ok(self.alloc(loc, ExprNodeKind::StringLiteral(tok.str_value)))
            }
            TokenType::Variable => {
                self.advance();
                let loc = self.loc(&tok);
                Ok(self.alloc(loc, ExprNodeKind::VarRef(Identifier::new(tok.str_value, loc.clone()))))
            }
            TokenType::Keyword if tok.str_value == "null" => {
                self.advance();
                Ok(self.alloc(self.loc(&tok), ExprNodeKind::NullLiteral))
            }
            TokenType::Keyword if tok.str_value == "true" => {
                self.advance();
                Ok(self.alloc(self.loc(&tok), ExprNodeKind::BoolLiteral(true)))
            }
            TokenType::Keyword if tok.str_value == "false" => {
                self.advance();
                Ok(self.alloc(self.loc(&tok), ExprNodeKind::BoolLiteral(false)))
            }
            TokenType::Identifier => self.parse_identifier_led(),
            TokenType::Operator if tok.str_value == "(" => {
                self.advance();
                let inner = self.parse_ternary()?;
                self.expect_operator(")")?;
                Ok(inner)
            }
            TokenType::Operator if tok.str_value == "[" => self.parse_list_literal_or_comprehension(),
            _ => Err(CompilerError::AssertionFailure(format!(
                "unexpected token `{}` in expression",
                tok.str_value
            ))),
        }
    }

    fn parse_identifier_led(&mut self) -> Result<NodeId> {
        let tok = self.advance();
        let loc = self.loc(&tok);
        if self.peek().is_operator("(") {
            return self.parse_call_like(&tok.str_value, loc);
        }
        if let Some((fqn, member)) = split_proto_enum_reference(&tok.str_value) {
            return Ok(self.alloc(loc, ExprNodeKind::ProtoEnumLiteral { fqn, member }));
        }
        Ok(self.alloc(loc.clone(), ExprNodeKind::Global(Identifier::new(tok.str_value, loc))))
    }

    /// `map(...)` literal form, proto init `pkg.MyProto(...)`, and plain
    /// function calls — all share `name(` syntax and are disambiguated by
    /// `name` (spec.md §6.1; `record` literals use bracket syntax instead,
    /// see `parse_list_literal_or_comprehension`).
    fn parse_call_like(&mut self, name: &str, loc: SourceLocation) -> Result<NodeId> {
        self.advance(); // `(`
        match name {
            "map" => {
                let fields = self.parse_keyed_entries()?;
                self.expect_operator(")")?;
                let entries = fields
                    .into_iter()
                    .map(|(k, v)| {
                        let key_loc = self.arena.location_of(v).clone();
                        let key_id = self.alloc(key_loc, ExprNodeKind::StringLiteral(k));
                        (key_id, v)
                    })
                    .collect();
                Ok(self.alloc(loc, ExprNodeKind::MapLiteral { entries }))
            }
            _ if name.contains('.') => {
                let fqn = name.to_string();
                let fields = self.parse_keyed_entries()?;
                self.expect_operator(")")?;
                Ok(self.alloc(loc, ExprNodeKind::ProtoInit { fqn, fields }))
            }
            _ => {
                let args = self.parse_call_args()?;
                Ok(self.alloc(loc.clone(), ExprNodeKind::FunctionCall {
                    name: Identifier::new(name, loc),
                    args,
                }))
            }
        }
    }

    /// Parses a comma-separated argument list up to and including the
    /// closing `)`; the opening `(` must already have been consumed.
    fn parse_call_args(&mut self) -> Result<Vec<NodeId>> {
        let mut args = Vec::new();
        if !self.peek().is_operator(")") {
            loop {
                args.push(self.parse_ternary()?);
                if self.peek().is_operator(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_operator(")")?;
        Ok(args)
    }

    fn parse_keyed_entries(&mut self) -> Result<Vec<(String, NodeId)>> {
        let mut entries = Vec::new();
        if self.peek().is_operator(")") {
            return Ok(entries);
        }
        loop {
            let key = self.expect_identifier_or_string()?;
            self.expect_operator(":")?;
            let value = self.parse_ternary()?;
            entries.push((key, value));
            if self.peek().is_operator(",") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(entries)
    }

    /// Looks ahead for `name :` (an identifier or string immediately
    /// followed by `:`) to tell a record literal's first entry apart from a
    /// list element or a ternary whose `:` belongs to `? :` further in.
    fn looks_like_record_entry(&self) -> bool {
        let key_tok = self.peek();
        matches!(key_tok.token_type, TokenType::Identifier | TokenType::String) && self.peek_at(1).is_operator(":")
    }

    fn parse_bracketed_keyed_entries(&mut self) -> Result<Vec<(String, NodeId)>> {
        let mut entries = Vec::new();
        loop {
            let key = self.expect_identifier_or_string()?;
            self.expect_operator(":")?;
            let value = self.parse_ternary()?;
            entries.push((key, value));
            if self.peek().is_operator(",") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(entries)
    }

    fn expect_identifier_or_string(&mut self) -> Result<String> {
        let tok = self.peek().clone();
        match tok.token_type {
            TokenType::Identifier | TokenType::String => {
                self.advance();
                Ok(tok.str_value)
            }
            _ => Err(CompilerError::AssertionFailure(format!("expected a field name, found `{}`", tok.str_value))),
        }
    }

    /// `[k: v, …]` (record), `[e1, e2, ...]` (list), or
    /// `[resultExpr for $x in listExpr (if condExpr)?]` (list comprehension)
    /// — all three share the `[` delimiter (spec.md §6.1). An empty `[]` is
    /// a list literal; `record` has no zero-field bracket form worth
    /// distinguishing from it.
    fn parse_list_literal_or_comprehension(&mut self) -> Result<NodeId> {
        let open = self.advance(); // `[`
        let loc = self.loc(&open);
        if self.peek().is_operator("]") {
            self.advance();
            return Ok(self.alloc(loc, ExprNodeKind::ListLiteral { items: vec![] }));
        }
        if self.looks_like_record_entry() {
            let fields = self.parse_bracketed_keyed_entries()?;
            self.expect_operator("]")?;
            return Ok(self.alloc(loc, ExprNodeKind::RecordLiteral { fields }));
        }
        let first = self.parse_ternary()?;
        if self.peek().is_keyword("for") {
            self.advance();
            let item_tok = self.peek().clone();
            if item_tok.token_type != TokenType::Variable {
                return Err(CompilerError::AssertionFailure("expected `$name` after `for`".into()));
            }
            self.advance();
            let item_name = Identifier::new(item_tok.str_value, self.loc(&item_tok));
            if !self.peek().is_keyword("in") {
                return Err(CompilerError::AssertionFailure("expected `in` in list comprehension".into()));
            }
            self.advance();
            let list_expr = self.parse_ternary()?;
            let filter = if self.peek().is_keyword("if") {
                self.advance();
                Some(self.parse_ternary()?)
            } else {
                None
            };
            self.expect_operator("]")?;
            return Ok(self.alloc(
                loc,
                ExprNodeKind::ListComprehension {
                    item_name,
                    index_name: None,
                    list_expr,
                    filter,
                    result_expr: first,
                },
            ));
        }
        let mut items = vec![first];
        while self.peek().is_operator(",") {
            self.advance();
            items.push(self.parse_ternary()?);
        }
        self.expect_operator("]")?;
        Ok(self.alloc(loc, ExprNodeKind::ListLiteral { items }))
    }
}

/// `pkg.MyProto.FIELD_NAME`-shaped identifiers where the final segment is
/// `SCREAMING_SNAKE_CASE` are proto enum member references (spec.md §3.2);
/// anything else dotted is a bare global name.
fn split_proto_enum_reference(name: &str) -> Option<(String, String)> {
    let (fqn, member) = name.rsplit_once('.')?;
    let is_enum_member = member.chars().all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit()) && member.chars().any(|c| c.is_ascii_alphabetic());
    if is_enum_member {
        Some((fqn.to_string(), member.to_string()))
    } else {
        None
    }
}

pub fn parse_expression(arena: &mut Arena, source: &str, path: crate::source::SourceFilePath, line: u32) -> Result<NodeId> {
    ExprParser::new(arena, source, path, line).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFilePath;

    fn parse(src: &str) -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let id = parse_expression(&mut arena, src, SourceFilePath::new("t.soy"), 1).unwrap();
        (arena, id)
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let (arena, id) = parse("1 + 2 * 3");
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::Binary { op: BinaryOp::Add, .. }) => {}
            other => panic!("expected a top-level Add, got {other:?}"),
        }
    }

    #[test]
    fn parses_field_and_null_safe_access() {
        let (arena, id) = parse("$a?.b.c");
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::FieldAccess { .. })));
    }

    #[test]
    fn parses_ternary_and_null_coalesce() {
        let (arena, id) = parse("$a ? $b : $c ?? $d");
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::Ternary { .. })));
    }

    #[test]
    fn parses_record_literal() {
        let (arena, id) = parse(r#"[a: 1, b: "x"]"#);
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::RecordLiteral { fields }) => assert_eq!(fields.len(), 2),
            other => panic!("expected a record literal, got {other:?}"),
        }
    }

    #[test]
    fn parses_list_comprehension() {
        let (arena, id) = parse("[$x for $x in $items if $x]");
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::ListComprehension { .. })));
    }

    #[test]
    fn parses_proto_enum_literal() {
        let (arena, id) = parse("pkg.MyEnum.FIRST_VALUE");
        match &arena.get(id).data {
            Node::Expr(ExprNodeKind::ProtoEnumLiteral { fqn, member }) => {
                assert_eq!(fqn, "pkg.MyEnum");
                assert_eq!(member, "FIRST_VALUE");
            }
            other => panic!("expected a proto enum literal, got {other:?}"),
        }
    }

    #[test]
    fn parses_non_null_assertion() {
        let (arena, id) = parse("$a!");
        assert!(matches!(arena.get(id).data, Node::Expr(ExprNodeKind::AssertNonNull { .. })));
    }
}
