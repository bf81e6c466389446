//! Type-annotation parser (`{@param x: list<string>|null}`, spec.md §3.2),
//! grounded in the same recursive-descent shape as `parser::expr` since both
//! reuse the expression lexer's generic single-char operator fallback for
//! `< > | ? [ ] :`.

use crate::ast::{Arena, Node, TypeNodeKind};
use crate::error::{CompilerError, Result};
use crate::lexer::expr::{tokenize, Token, TokenType};
use crate::node::{NodeId, SourceLocation};

pub struct TypeParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    arena: &'a mut Arena,
    path: crate::source::SourceFilePath,
    line: u32,
}

impl<'a> TypeParser<'a> {
    pub fn new(arena: &'a mut Arena, source: &str, path: crate::source::SourceFilePath, line: u32) -> Self {
        TypeParser {
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

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub fn parse(&mut self) -> Result<NodeId> {
        self.parse_union()
    }

    fn alloc(&mut self, loc: SourceLocation, kind: TypeNodeKind) -> NodeId {
        let id = self.arena.alloc(None, loc, Node::Type(kind));
        for child in self.arena.children_of(id) {
            self.arena.get_mut(child).parent = Some(id);
        }
        id
    }

    /// `?T` (leading) and `T|U|…` (infix) both widen to a `Union` with an
    /// explicit `Named("null")` member (spec.md §3.2 nullability-as-union).
    fn parse_union(&mut self) -> Result<NodeId> {
        let mut members = vec![self.parse_postfix_nullable()?];
        while self.peek().is_operator("|") {
            self.advance();
            members.push(self.parse_postfix_nullable()?);
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            let loc = self.arena.location_of(members[0]).clone();
            Ok(self.alloc(loc, TypeNodeKind::Union(members)))
        }
    }

    fn parse_postfix_nullable(&mut self) -> Result<NodeId> {
        let base = self.parse_primary()?;
        if self.peek().is_operator("?") {
            let tok = self.advance();
            let loc = self.loc(&tok);
            let null_id = self.alloc(loc.clone(), TypeNodeKind::Named("null".into()));
            return Ok(self.alloc(loc, TypeNodeKind::Union(vec![base, null_id])));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        let tok = self.peek().clone();
        if tok.is_operator("?") {
            self.advance();
            let inner = self.parse_primary()?;
            let loc = self.loc(&tok);
            let null_id = self.alloc(loc.clone(), TypeNodeKind::Named("null".into()));
            return Ok(self.alloc(loc, TypeNodeKind::Union(vec![inner, null_id])));
        }
        if tok.is_operator("[") {
            return self.parse_record();
        }
        if matches!(tok.token_type, TokenType::Identifier | TokenType::Keyword) {
            self.advance();
            let loc = self.loc(&tok);
            if self.peek().is_operator("<") {
                self.advance();
                let mut args = vec![self.parse_union()?];
                while self.peek().is_operator(",") {
                    self.advance();
                    args.push(self.parse_union()?);
                }
                self.expect_operator(">")?;
                return Ok(self.alloc(
                    loc,
                    TypeNodeKind::Generic {
                        name: tok.str_value,
                        args,
                    },
                ));
            }
            return Ok(self.alloc(loc, TypeNodeKind::Named(tok.str_value)));
        }
        Err(CompilerError::AssertionFailure(format!("unexpected token `{}` in type annotation", tok.str_value)))
    }

    fn parse_record(&mut self) -> Result<NodeId> {
        let open = self.advance(); // `[`
        let loc = self.loc(&open);
        let mut fields = Vec::new();
        if !self.peek().is_operator("]") {
            loop {
                let name_tok = self.advance();
                self.expect_operator(":")?;
                let ty = self.parse_union()?;
                fields.push((name_tok.str_value, ty));
                if self.peek().is_operator(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_operator("]")?;
        Ok(self.alloc(loc, TypeNodeKind::Record(fields)))
    }

    fn expect_operator(&mut self, op: &str) -> Result<()> {
        if self.peek().is_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(CompilerError::AssertionFailure(format!("expected `{op}` in type annotation, found `{}`", self.peek().str_value)))
        }
    }
}

pub fn parse_type(arena: &mut Arena, source: &str, path: crate::source::SourceFilePath, line: u32) -> Result<NodeId> {
    TypeParser::new(arena, source, path, line).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFilePath;

    fn parse(src: &str) -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let id = parse_type(&mut arena, src, SourceFilePath::new("t.soy"), 1).unwrap();
        (arena, id)
    }

    #[test]
    fn parses_a_named_type() {
        let (arena, id) = parse("string");
        assert!(matches!(arena.get(id).data, Node::Type(TypeNodeKind::Named(ref n)) if n == "string"));
    }

    #[test]
    fn parses_generic_list_of_records() {
        let (arena, id) = parse("list<[a: string, b: int]>");
        match &arena.get(id).data {
            Node::Type(TypeNodeKind::Generic { name, args }) => {
                assert_eq!(name, "list");
                assert_eq!(args.len(), 1);
                assert!(matches!(arena.get(args[0]).data, Node::Type(TypeNodeKind::Record(_))));
            }
            other => panic!("expected a generic type, got {other:?}"),
        }
    }

    #[test]
    fn leading_question_mark_widens_to_nullable_union() {
        let (arena, id) = parse("?string");
        match &arena.get(id).data {
            Node::Type(TypeNodeKind::Union(members)) => assert_eq!(members.len(), 2),
            other => panic!("expected a union, got {other:?}"),
        }
    }

    #[test]
    fn pipe_union_of_three_members() {
        let (arena, id) = parse("string|int|null");
        match &arena.get(id).data {
            Node::Type(TypeNodeKind::Union(members)) => assert_eq!(members.len(), 3),
            other => panic!("expected a union, got {other:?}"),
        }
    }
}
