//! Command/template-body parser (spec.md §4.2, §6.1).
//!
//! A single left-to-right scan over the file's characters. At each position
//! it dispatches on the next character: `<` starts HTML (an open tag, a
//! close tag, or a comment), `{` starts a command, anything else is plain
//! text. HTML nesting is never validated here — `HtmlOpenTag`/`HtmlCloseTag`
//! land as flat siblings in a template's `body`, exactly like every other
//! statement; well-formedness (if checked at all) is a later pass's job.
//!
//! Unlike `parser::expr`/`parser::ty`, a bad command does not abort the
//! parse: it is reported through the `ErrorReporter` and the scan continues
//! from the next token, so one file yields every diagnostic it can in a
//! single pass rather than stopping at the first mistake.

use std::collections::HashMap;

use crate::ast::{
    Arena, AutoescapeMode, ContentKind, ExprNodeKind, Node, QuoteStyle, SoyNodeKind, TemplateData,
    TemplateDeclKind, TemplateVisibility,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter};
use crate::node::{Identifier, NodeId, SourceLocation};
use crate::source::SourceFilePath;

/// What a block-terminating command (`{/if}`, `{elseif …}`, `{case …}`, …)
/// actually said, so the caller that owns the loop (`parse_if`, `parse_switch`, …)
/// can read its payload instead of just learning that the block ended.
struct Terminator {
    tag: String,
    rest: String,
    loc: SourceLocation,
}

struct FileParser<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    path: SourceFilePath,
    arena: &'a mut Arena,
    reporter: &'a mut ErrorReporter,
}

impl<'a> FileParser<'a> {
    // -- low-level character cursor -----------------------------------

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        let needle: Vec<char> = s.chars().collect();
        self.pos + needle.len() <= self.chars.len() && self.chars[self.pos..self.pos + needle.len()] == needle[..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if let Some(ch) = c {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        c
    }

    fn here(&self) -> (u32, u32) {
        (self.line, self.col)
    }

    fn loc_from(&self, start: (u32, u32)) -> SourceLocation {
        SourceLocation::new(self.path.clone(), start.0, start.1, self.line, self.col)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            if matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump();
                continue;
            }
            if self.starts_with("/*") {
                self.bump();
                self.bump();
                while self.peek_char().is_some() && !self.starts_with("*/") {
                    self.bump();
                }
                self.bump();
                self.bump();
                continue;
            }
            if self.starts_with("//") {
                while !matches!(self.peek_char(), Some('\n') | None) {
                    self.bump();
                }
                continue;
            }
            break;
        }
    }

    fn scan_name(&mut self) -> String {
        let mut s = String::new();
        while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '-' || c == ':' || c == '_') {
            s.push(self.bump().unwrap());
        }
        s
    }

    fn report_error(&mut self, loc: SourceLocation, kind: DiagnosticKind, message: String) {
        self.reporter.report(Diagnostic::error(loc, kind, message));
    }

    // -- arena helpers ---------------------------------------------------

    fn alloc_soy(&mut self, loc: SourceLocation, kind: SoyNodeKind) -> NodeId {
        let id = self.arena.alloc(None, loc, Node::Soy(kind));
        for child in self.arena.children_of(id) {
            self.arena.get_mut(child).parent = Some(id);
        }
        id
    }

    fn alloc_expr(&mut self, loc: SourceLocation, kind: ExprNodeKind) -> NodeId {
        let id = self.arena.alloc(None, loc, Node::Expr(kind));
        for child in self.arena.children_of(id) {
            self.arena.get_mut(child).parent = Some(id);
        }
        id
    }

    fn parse_expr_str(&mut self, src: &str, start: (u32, u32)) -> NodeId {
        match super::expr::parse_expression(self.arena, src, self.path.clone(), start.0) {
            Ok(id) => id,
            Err(e) => {
                let loc = SourceLocation::new(self.path.clone(), start.0, start.1, start.0, start.1 + src.chars().count() as u32);
                self.report_error(loc.clone(), DiagnosticKind::ParseError, format!("invalid expression `{src}`: {e}"));
                self.alloc_expr(loc, ExprNodeKind::NullLiteral)
            }
        }
    }

    fn parse_type_str(&mut self, src: &str, start: (u32, u32)) -> NodeId {
        match super::ty::parse_type(self.arena, src, self.path.clone(), start.0) {
            Ok(id) => id,
            Err(e) => {
                let loc = SourceLocation::new(self.path.clone(), start.0, start.1, start.0, start.1 + src.chars().count() as u32);
                self.report_error(loc.clone(), DiagnosticKind::UnknownType, format!("invalid type `{src}`: {e}"));
                let id = self.arena.alloc(None, loc, Node::Type(crate::ast::TypeNodeKind::Named("any".into())));
                id
            }
        }
    }

    fn attr_value_as_expr(&mut self, raw: &str, loc: SourceLocation) -> NodeId {
        if raw.starts_with('$') {
            self.parse_expr_str(raw, (loc.start_line, loc.start_col))
        } else {
            self.alloc_expr(loc, ExprNodeKind::StringLiteral(raw.to_string()))
        }
    }

    // -- `{…}` command scanning ------------------------------------------

    /// Consumes a whole `{…}` command, respecting quoted strings so a
    /// literal `}` inside `variant="a}b"` doesn't end the command early.
    fn scan_brace_command(&mut self) -> (String, SourceLocation) {
        let start = self.here();
        self.bump(); // '{'
        let mut text = String::new();
        let mut quote: Option<char> = None;
        let mut terminated = false;
        loop {
            match self.peek_char() {
                None => break,
                Some(c) => {
                    if let Some(q) = quote {
                        text.push(c);
                        self.bump();
                        if c == q {
                            quote = None;
                        }
                    } else if c == '"' || c == '\'' {
                        quote = Some(c);
                        text.push(c);
                        self.bump();
                    } else if c == '}' {
                        self.bump();
                        terminated = true;
                        break;
                    } else {
                        text.push(c);
                        self.bump();
                    }
                }
            }
        }
        let loc = self.loc_from(start);
        if !terminated {
            self.report_error(loc.clone(), DiagnosticKind::UnterminatedCommand, "unterminated `{` command".to_string());
        }
        (text, loc)
    }

    fn scan_literal_block(&mut self, open_loc: &SourceLocation) -> (String, SourceLocation) {
        let start = (open_loc.start_line, open_loc.start_col);
        let mut text = String::new();
        loop {
            if self.starts_with("{/literal}") {
                for _ in 0.."{/literal}".chars().count() {
                    self.bump();
                }
                break;
            }
            match self.bump() {
                Some(c) => text.push(c),
                None => break,
            }
        }
        (text, self.loc_from(start))
    }

    // -- statement-level scanning -----------------------------------------

    /// Scans statements until one of `terminators` is hit (consumed) or EOF.
    /// When `collect_params` is set, `{@param}`/`{@param?}`/`{@inject}`/
    /// `{@state}` are siphoned off into the first two return slots instead of
    /// landing in `body` — only a template's immediate body does this.
    fn parse_statements(&mut self, terminators: &[&str], collect_params: bool) -> (Vec<NodeId>, Vec<NodeId>, Vec<NodeId>, Terminator) {
        let mut params = Vec::new();
        let mut state_vars = Vec::new();
        let mut body = Vec::new();
        let mut text_buf = String::new();
        let mut text_start: Option<(u32, u32)> = None;

        macro_rules! flush_text {
            () => {
                if !text_buf.is_empty() {
                    let loc = self.loc_from(text_start.unwrap());
                    body.push(self.alloc_soy(loc, SoyNodeKind::RawText(std::mem::take(&mut text_buf))));
                    text_start = None;
                }
            };
        }

        loop {
            match self.peek_char() {
                None => {
                    flush_text!();
                    let loc = self.loc_from(self.here());
                    self.report_error(
                        loc.clone(),
                        DiagnosticKind::UnterminatedCommand,
                        format!("reached end of file looking for one of {terminators:?}"),
                    );
                    let fallback_tag = terminators.first().map(|s| s.to_string()).unwrap_or_default();
                    return (
                        params,
                        state_vars,
                        body,
                        Terminator {
                            tag: fallback_tag,
                            rest: String::new(),
                            loc,
                        },
                    );
                }
                Some('<') if self.starts_with("<!--") => {
                    flush_text!();
                    body.push(self.parse_html_comment());
                }
                Some('<') if self.starts_with("</") => {
                    flush_text!();
                    body.push(self.parse_html_close_tag());
                }
                Some('<') if self.peek_at(1).map(|c| c.is_ascii_alphabetic()).unwrap_or(false) => {
                    flush_text!();
                    body.push(self.parse_html_open_tag());
                }
                Some('{') => {
                    let (raw_text, loc) = self.scan_brace_command();
                    let trimmed = raw_text.trim();

                    if let Some(literal) = char_escape_literal(trimmed) {
                        if text_start.is_none() {
                            text_start = Some((loc.start_line, loc.start_col));
                        }
                        text_buf.push_str(literal);
                        continue;
                    }

                    if trimmed == "literal" {
                        flush_text!();
                        let (raw, raw_loc) = self.scan_literal_block(&loc);
                        body.push(self.alloc_soy(raw_loc, SoyNodeKind::Literal(raw)));
                        continue;
                    }

                    let (tag, rest, self_closing) = split_command(trimmed);

                    if terminators.contains(&tag.as_str()) {
                        flush_text!();
                        return (params, state_vars, body, Terminator { tag, rest, loc });
                    }

                    flush_text!();

                    if collect_params && (tag == "@param" || tag == "@param?" || tag == "@inject") {
                        params.push(self.parse_at_param(&tag, &rest, loc));
                    } else if collect_params && tag == "@state" {
                        state_vars.push(self.parse_at_param("@param", &rest, loc));
                    } else if let Some(node) = self.dispatch_command(&tag, &rest, self_closing, loc.clone()) {
                        body.push(node);
                    } else {
                        body.push(self.parse_print(trimmed, loc));
                    }
                }
                Some(c) => {
                    if text_start.is_none() {
                        text_start = Some(self.here());
                    }
                    text_buf.push(c);
                    self.bump();
                }
            }
        }
    }

    fn dispatch_command(&mut self, tag: &str, rest: &str, self_closing: bool, loc: SourceLocation) -> Option<NodeId> {
        match tag {
            "if" => Some(self.parse_if(rest, loc)),
            "switch" => Some(self.parse_switch(rest, loc)),
            "for" => Some(self.parse_for(rest, loc)),
            "let" => Some(self.parse_let(rest, self_closing, loc)),
            "call" => Some(self.parse_call(false, rest, self_closing, loc)),
            "delcall" => Some(self.parse_call(true, rest, self_closing, loc)),
            "param" => Some(self.parse_param(rest, self_closing, loc)),
            "msg" => Some(self.parse_msg(rest, loc)),
            "velog" => Some(self.parse_velog(rest, loc)),
            "print" => Some(self.parse_print(rest, loc)),
            _ => None,
        }
    }

    // -- individual commands ----------------------------------------------

    fn parse_print(&mut self, text: &str, loc: SourceLocation) -> NodeId {
        let segments = split_top_level(text, '|');
        let expr_src = segments.first().cloned().unwrap_or_default();
        let expr = self.parse_expr_str(expr_src.trim(), (loc.start_line, loc.start_col));
        let directives = segments[1..]
            .iter()
            .map(|d| Identifier::new(d.trim().to_string(), loc.clone()))
            .collect();
        self.alloc_soy(loc, SoyNodeKind::Print { expr, directives })
    }

    fn parse_if(&mut self, rest: &str, loc: SourceLocation) -> NodeId {
        let mut cond = self.parse_expr_str(rest.trim(), (loc.start_line, loc.start_col));
        let mut branches = Vec::new();
        loop {
            let (_, _, body, term) = self.parse_statements(&["elseif", "else", "/if"], false);
            branches.push((cond, body));
            match term.tag.as_str() {
                "elseif" => {
                    cond = self.parse_expr_str(term.rest.trim(), (term.loc.start_line, term.loc.start_col));
                }
                "else" => {
                    let (_, _, else_body, _) = self.parse_statements(&["/if"], false);
                    return self.alloc_soy(loc, SoyNodeKind::If { branches, else_branch: Some(else_body) });
                }
                _ => return self.alloc_soy(loc, SoyNodeKind::If { branches, else_branch: None }),
            }
        }
    }

    fn parse_switch(&mut self, rest: &str, loc: SourceLocation) -> NodeId {
        let expr = self.parse_expr_str(rest.trim(), (loc.start_line, loc.start_col));
        let mut cases: Vec<(Vec<NodeId>, Vec<NodeId>)> = Vec::new();
        let mut default: Option<Vec<NodeId>> = None;
        let (_, _, _, mut term) = self.parse_statements(&["case", "default", "/switch"], false);
        loop {
            match term.tag.as_str() {
                "case" => {
                    let values: Vec<NodeId> = split_top_level(&term.rest, ',')
                        .into_iter()
                        .map(|s| self.parse_expr_str(s.trim(), (term.loc.start_line, term.loc.start_col)))
                        .collect();
                    let (_, _, body, next_term) = self.parse_statements(&["case", "default", "/switch"], false);
                    cases.push((values, body));
                    term = next_term;
                }
                "default" => {
                    let (_, _, body, _) = self.parse_statements(&["/switch"], false);
                    default = Some(body);
                    break;
                }
                _ => break,
            }
        }
        self.alloc_soy(loc, SoyNodeKind::Switch { expr, cases, default })
    }

    fn parse_for(&mut self, rest: &str, loc: SourceLocation) -> NodeId {
        let rest_t = rest.trim_start();
        let without_sigil = rest_t.strip_prefix('$').unwrap_or(rest_t);
        let (name_str, after) = split_ident_prefix(without_sigil);
        let var_name = Identifier::new(name_str.to_string(), loc.clone());
        let after = after.trim_start();
        let list_src = after.strip_prefix("in").map(|s| s.trim_start()).unwrap_or(after);
        let list_expr = self.parse_expr_str(list_src, (loc.start_line, loc.start_col));
        let (_, _, body, term) = self.parse_statements(&["ifempty", "/for"], false);
        let if_empty = if term.tag == "ifempty" {
            let (_, _, b, _) = self.parse_statements(&["/for"], false);
            Some(b)
        } else {
            None
        };
        self.alloc_soy(
            loc,
            SoyNodeKind::For {
                var_name,
                list_expr,
                body,
                if_empty,
            },
        )
    }

    fn parse_let(&mut self, rest: &str, self_closing: bool, loc: SourceLocation) -> NodeId {
        let rest_t = rest.trim_start();
        let without_sigil = rest_t.strip_prefix('$').unwrap_or(rest_t);
        let (name_str, after) = split_ident_prefix(without_sigil);
        let name = Identifier::new(name_str.to_string(), loc.clone());
        let after = after.trim_start();
        if self_closing {
            let expr_src = after.strip_prefix(':').unwrap_or(after).trim();
            let value = self.parse_expr_str(expr_src, (loc.start_line, loc.start_col));
            self.alloc_soy(
                loc,
                SoyNodeKind::Let {
                    name,
                    value: Some(value),
                    content: vec![],
                    kind: None,
                },
            )
        } else {
            let attrs = parse_attrs(after.trim_start_matches(':').trim());
            let kind = attrs.get("kind").and_then(|k| content_kind_from_str(k));
            let (_, _, content, _) = self.parse_statements(&["/let"], false);
            self.alloc_soy(loc, SoyNodeKind::Let { name, value: None, content, kind })
        }
    }

    fn parse_call(&mut self, is_delegate: bool, rest: &str, self_closing: bool, loc: SourceLocation) -> NodeId {
        let (name_str, after) = split_first_word(rest.trim_start());
        let attrs = parse_attrs(&after);
        let template_name = Identifier::new(name_str, loc.clone());
        let data_all = attrs.get("data").map(|d| d == "all").unwrap_or(false);
        let variant = if is_delegate {
            attrs.get("variant").map(|v| self.attr_value_as_expr(v, loc.clone()))
        } else {
            None
        };
        let params = if self_closing {
            Vec::new()
        } else {
            let (_, _, params, _) = self.parse_statements(&["/call", "/delcall"], false);
            params
        };
        if is_delegate {
            self.alloc_soy(
                loc,
                SoyNodeKind::CallDelegate {
                    template_name,
                    variant,
                    data_all,
                    params,
                },
            )
        } else {
            self.alloc_soy(loc, SoyNodeKind::CallBasic { template_name, data_all, params })
        }
    }

    fn parse_param(&mut self, rest: &str, self_closing: bool, loc: SourceLocation) -> NodeId {
        let rest_t = rest.trim_start();
        let (name_str, after) = split_ident_prefix(rest_t);
        let name = Identifier::new(name_str.to_string(), loc.clone());
        let after = after.trim_start();
        if self_closing {
            let expr_src = after.strip_prefix(':').unwrap_or(after).trim();
            let value = self.parse_expr_str(expr_src, (loc.start_line, loc.start_col));
            self.alloc_soy(loc, SoyNodeKind::CallParamValue { name, value })
        } else {
            let attrs = parse_attrs(after.trim_start_matches(':').trim());
            let kind = attrs.get("kind").and_then(|k| content_kind_from_str(k));
            let (_, _, content, _) = self.parse_statements(&["/param"], false);
            self.alloc_soy(loc, SoyNodeKind::CallParamContent { name, content, kind })
        }
    }

    fn parse_msg(&mut self, rest: &str, loc: SourceLocation) -> NodeId {
        let attrs = parse_attrs(rest.trim());
        let desc = attrs.get("desc").cloned();
        let (_, _, body, term) = self.parse_statements(&["fallbackmsg", "/msg"], false);
        let fallback = if term.tag == "fallbackmsg" {
            let (_, _, fb, _) = self.parse_statements(&["/msg"], false);
            Some(fb)
        } else {
            None
        };
        self.alloc_soy(loc, SoyNodeKind::Msg { desc, body, fallback })
    }

    fn parse_velog(&mut self, rest: &str, loc: SourceLocation) -> NodeId {
        let logging_id = self.parse_expr_str(rest.trim(), (loc.start_line, loc.start_col));
        let (_, _, body, _) = self.parse_statements(&["/velog"], false);
        self.alloc_soy(loc, SoyNodeKind::Velog { logging_id, body })
    }

    fn parse_at_param(&mut self, tag: &str, rest: &str, loc: SourceLocation) -> NodeId {
        let required = tag != "@param?";
        let injected = tag == "@inject";
        let rest_t = rest.trim_start();
        let (name_str, after) = split_ident_prefix(rest_t);
        let name = Identifier::new(name_str.to_string(), loc.clone());
        let after = after.trim_start();
        let rest_after_colon = after.strip_prefix(':').unwrap_or(after).trim();
        let (ty_src, default_src) = split_type_and_default(rest_after_colon);
        let ty_node = if ty_src.trim().is_empty() {
            None
        } else {
            Some(self.parse_type_str(ty_src.trim(), (loc.start_line, loc.start_col)))
        };
        let default = default_src.map(|d| self.parse_expr_str(d.trim(), (loc.start_line, loc.start_col)));
        self.alloc_soy(
            loc,
            SoyNodeKind::Param {
                name,
                ty_node,
                required,
                injected,
                default,
            },
        )
    }

    // -- HTML ---------------------------------------------------------------

    fn parse_html_open_tag(&mut self) -> NodeId {
        let start = self.here();
        self.bump(); // '<'
        let name = self.scan_name();
        let mut attributes = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_ws();
            match self.peek_char() {
                None => break,
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('/') if self.peek_at(1) == Some('>') => {
                    self.bump();
                    self.bump();
                    self_closing = true;
                    break;
                }
                Some('{') => {
                    // A dynamic attribute (rare in practice): the expression
                    // itself isn't modeled as a distinct attribute node here.
                    self.scan_brace_command();
                }
                Some(_) => {
                    attributes.push(self.parse_html_attribute());
                }
            }
        }
        let loc = self.loc_from(start);
        self.alloc_soy(loc, SoyNodeKind::HtmlOpenTag { name, attributes, self_closing })
    }

    fn parse_html_close_tag(&mut self) -> NodeId {
        let start = self.here();
        self.bump();
        self.bump(); // "</"
        let name = self.scan_name();
        self.skip_ws();
        if self.peek_char() == Some('>') {
            self.bump();
        }
        let loc = self.loc_from(start);
        self.alloc_soy(loc, SoyNodeKind::HtmlCloseTag { name })
    }

    fn parse_html_comment(&mut self) -> NodeId {
        let start = self.here();
        for _ in 0..4 {
            self.bump();
        } // "<!--"
        let mut text = String::new();
        while self.peek_char().is_some() && !(self.peek_char() == Some('-') && self.peek_at(1) == Some('-') && self.peek_at(2) == Some('>')) {
            text.push(self.bump().unwrap());
        }
        if self.peek_char().is_some() {
            self.bump();
            self.bump();
            self.bump();
        }
        let loc = self.loc_from(start);
        self.alloc_soy(loc, SoyNodeKind::HtmlComment(text))
    }

    fn parse_html_attribute(&mut self) -> NodeId {
        let start = self.here();
        let name = self.scan_name();
        self.skip_ws();
        let value = if self.peek_char() == Some('=') {
            self.bump();
            self.skip_ws();
            Some(self.parse_html_attribute_value())
        } else {
            None
        };
        let loc = self.loc_from(start);
        self.alloc_soy(loc, SoyNodeKind::HtmlAttribute { name, value })
    }

    fn parse_html_attribute_value(&mut self) -> NodeId {
        let start = self.here();
        let quote = match self.peek_char() {
            Some('"') => {
                self.bump();
                QuoteStyle::Double
            }
            Some('\'') => {
                self.bump();
                QuoteStyle::Single
            }
            _ => QuoteStyle::None,
        };
        let end_char = match quote {
            QuoteStyle::Double => Some('"'),
            QuoteStyle::Single => Some('\''),
            QuoteStyle::None => None,
        };
        let mut parts = Vec::new();
        let mut text_buf = String::new();
        let mut text_start: Option<(u32, u32)> = None;
        loop {
            match self.peek_char() {
                None => break,
                Some(c) if end_char == Some(c) => {
                    self.bump();
                    break;
                }
                Some(c) if end_char.is_none() && (c.is_whitespace() || c == '>' || c == '/') => break,
                Some('{') => {
                    if !text_buf.is_empty() {
                        let tloc = self.loc_from(text_start.unwrap());
                        parts.push(self.alloc_soy(tloc, SoyNodeKind::RawText(std::mem::take(&mut text_buf))));
                        text_start = None;
                    }
                    let (text, cloc) = self.scan_brace_command();
                    let trimmed = text.trim();
                    if let Some(literal) = char_escape_literal(trimmed) {
                        parts.push(self.alloc_soy(cloc, SoyNodeKind::RawText(literal.to_string())));
                    } else {
                        parts.push(self.parse_print(trimmed, cloc));
                    }
                }
                Some(c) => {
                    if text_start.is_none() {
                        text_start = Some(self.here());
                    }
                    text_buf.push(c);
                    self.bump();
                }
            }
        }
        if !text_buf.is_empty() {
            let tloc = self.loc_from(text_start.unwrap());
            parts.push(self.alloc_soy(tloc, SoyNodeKind::RawText(text_buf)));
        }
        let loc = self.loc_from(start);
        self.alloc_soy(loc, SoyNodeKind::HtmlAttributeValue { quote, parts })
    }

    // -- template / top level ------------------------------------------------

    fn parse_template_body(&mut self, terminators: &[&str]) -> (Vec<NodeId>, Vec<NodeId>, Vec<NodeId>) {
        let (params, state_vars, body, _term) = self.parse_statements(terminators, true);
        (params, state_vars, body)
    }

    fn parse_template(&mut self, decl_kind: TemplateDeclKind, header_rest: &str, header_loc: SourceLocation) -> NodeId {
        let (name_tok, attr_str) = split_first_word(header_rest);
        let attrs = parse_attrs(&attr_str);
        let name = Identifier::new(name_tok, header_loc.clone());
        let content_kind = attrs.get("kind").and_then(|k| content_kind_from_str(k));
        let autoescape = attrs.get("autoescape").map(|a| autoescape_from_str(a)).unwrap_or(AutoescapeMode::Strict);
        let visibility = match attrs.get("visibility").map(String::as_str) {
            Some("private") => TemplateVisibility::Private,
            _ => TemplateVisibility::Public,
        };
        let strict_html = attrs.get("stricthtml").map(|v| v == "true").unwrap_or(true);
        let require_css = attrs
            .get("requirecss")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let delegate_variant = attrs.get("variant").cloned();
        let terminator = match decl_kind {
            TemplateDeclKind::Basic => "/template",
            TemplateDeclKind::Delegate => "/deltemplate",
            TemplateDeclKind::Element => "/element",
        };
        let (params, state_vars, body) = self.parse_template_body(&[terminator]);
        let data = TemplateData {
            name,
            decl_kind,
            content_kind,
            autoescape,
            params,
            state_vars,
            strict_html,
            visibility,
            require_css,
            delegate_package: None,
            delegate_variant,
            body,
        };
        self.alloc_soy(header_loc, SoyNodeKind::Template(data))
    }

    fn parse_import(&mut self, rest: &str, loc: SourceLocation) -> NodeId {
        let (symbols_part, from_part) = rest.split_once("from").unwrap_or((rest, ""));
        let symbols: Vec<Identifier> = symbols_part
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Identifier::new(s.to_string(), loc.clone()))
            .collect();
        let from_path = from_part.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
        self.alloc_soy(loc, SoyNodeKind::Import { symbols, from_path })
    }
}

// -- free helpers --------------------------------------------------------

fn split_command(trimmed: &str) -> (String, String, bool) {
    let (body_text, self_closing) = if let Some(stripped) = trimmed.strip_suffix('/') {
        (stripped.trim_end(), true)
    } else {
        (trimmed, false)
    };
    let (tag, rest) = split_first_word(body_text);
    (tag, rest, self_closing)
}

fn split_first_word(s: &str) -> (String, String) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (s[..idx].to_string(), s[idx..].trim_start().to_string()),
        None => (s.to_string(), String::new()),
    }
}

fn split_ident_prefix(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Splits `"Type = default"` into its type text and an optional default
/// expression text, on the first unquoted, unbracketed `=`.
fn split_type_and_default(s: &str) -> (&str, Option<&str>) {
    let chars: Vec<char> = s.chars().collect();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, &c) in chars.iter().enumerate() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '<' | '[' => depth += 1,
            '>' | ']' => depth -= 1,
            '=' if depth == 0 => {
                let byte_idx: usize = chars[..i].iter().map(|c| c.len_utf8()).sum();
                return (&s[..byte_idx], Some(&s[byte_idx + 1..]));
            }
            _ => {}
        }
    }
    (s, None)
}

/// Splits on `sep` at bracket/paren depth zero, treating `||` as a single
/// (non-splitting) operator so ``$a || $b`` survives a `|`-split untouched.
fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                i += 1;
            }
            '(' | '[' => {
                depth += 1;
                i += 1;
            }
            ')' | ']' => {
                depth -= 1;
                i += 1;
            }
            _ if c == sep && depth == 0 => {
                if sep == '|' && chars.get(i + 1) == Some(&'|') {
                    i += 2;
                    continue;
                }
                parts.push(chars[start..i].iter().collect());
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(chars[start..].iter().collect());
    parts
}

fn parse_attrs(s: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let key_start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-') {
            i += 1;
        }
        let key: String = chars[key_start..i].iter().collect();
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i < chars.len() && chars[i] == '=' {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let quote = chars[i];
                i += 1;
                let val_start = i;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                let value: String = chars[val_start..i].iter().collect();
                if i < chars.len() {
                    i += 1;
                }
                if !key.is_empty() {
                    attrs.insert(key, value);
                }
                continue;
            }
        }
        if key.is_empty() {
            i += 1;
        }
    }
    attrs
}

fn char_escape_literal(trimmed: &str) -> Option<&'static str> {
    match trimmed {
        "lb" => Some("{"),
        "rb" => Some("}"),
        "sp" => Some(" "),
        "nil" => Some(""),
        "\\n" => Some("\n"),
        "\\r" => Some("\r"),
        "\\t" => Some("\t"),
        _ => None,
    }
}

fn content_kind_from_str(s: &str) -> Option<ContentKind> {
    Some(match s {
        "html" => ContentKind::Html,
        "attributes" => ContentKind::Attributes,
        "css" => ContentKind::Css,
        "uri" => ContentKind::Uri,
        "trusted_resource_uri" => ContentKind::TrustedResourceUri,
        "js" => ContentKind::Js,
        "text" => ContentKind::Text,
        _ => return None,
    })
}

fn autoescape_from_str(s: &str) -> AutoescapeMode {
    match s {
        "contextual" => AutoescapeMode::Contextual,
        "deprecated-noncontextual" => AutoescapeMode::DeprecatedNoncontextual,
        _ => AutoescapeMode::Strict,
    }
}

/// Parses one `.soy` file into a `SoyNodeKind::File` node. Never fails: a
/// malformed command is reported on `reporter` and parsing recovers at the
/// next token, matching spec.md §4.2's "errors do not throw".
pub fn parse_file(arena: &mut Arena, reporter: &mut ErrorReporter, path: SourceFilePath, source: &str) -> NodeId {
    let mut p = FileParser {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        col: 0,
        path: path.clone(),
        arena,
        reporter,
    };

    let mut namespace = String::new();
    let mut imports = Vec::new();
    let mut templates = Vec::new();

    p.skip_ws_and_comments();
    while let Some(c) = p.peek_char() {
        if c == '{' {
            let (text, loc) = p.scan_brace_command();
            let trimmed = text.trim();
            let (tag, rest, _self_closing) = split_command(trimmed);
            match tag.as_str() {
                "namespace" => namespace = rest.split_whitespace().next().unwrap_or("").to_string(),
                "import" => imports.push(p.parse_import(&rest, loc)),
                "template" => templates.push(p.parse_template(TemplateDeclKind::Basic, &rest, loc)),
                "deltemplate" => templates.push(p.parse_template(TemplateDeclKind::Delegate, &rest, loc)),
                "element" => templates.push(p.parse_template(TemplateDeclKind::Element, &rest, loc)),
                "delpackage" => {}
                _ => p.report_error(loc, DiagnosticKind::ParseError, format!("unexpected top-level command `{{{tag}}}`")),
            }
        } else {
            p.bump();
        }
        p.skip_ws_and_comments();
    }

    let file_loc = SourceLocation::new(path, 1, 0, p.line, p.col);
    p.alloc_soy(file_loc, SoyNodeKind::File { namespace, imports, templates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SoyNodeKind;

    fn parse(src: &str) -> (Arena, ErrorReporter, NodeId) {
        let mut arena = Arena::new();
        let mut reporter = ErrorReporter::new();
        let id = parse_file(&mut arena, &mut reporter, SourceFilePath::new("t.soy"), src);
        (arena, reporter, id)
    }

    #[test]
    fn parses_namespace_and_one_template() {
        let (arena, reporter, id) = parse(
            r#"{namespace my.ns}

            {template .greet}
              {@param name: string}
              <div class="greeting">Hello, {$name}!</div>
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
        match &arena.get(id).data {
            Node::Soy(SoyNodeKind::File { namespace, templates, .. }) => {
                assert_eq!(namespace, "my.ns");
                assert_eq!(templates.len(), 1);
                match &arena.get(templates[0]).data {
                    Node::Soy(SoyNodeKind::Template(data)) => {
                        assert_eq!(data.name.name, ".greet");
                        assert_eq!(data.params.len(), 1);
                        assert!(data.body.len() >= 1);
                    }
                    other => panic!("expected a template, got {other:?}"),
                }
            }
            other => panic!("expected a file, got {other:?}"),
        }
        assert!(arena.check_integrity().is_ok());
    }

    #[test]
    fn parses_if_elseif_else_chain() {
        let (arena, reporter, _) = parse(
            r#"{namespace ns}
            {template .t}
              {@param x: int}
              {if $x > 0}
                positive
              {elseif $x < 0}
                negative
              {else}
                zero
              {/if}
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
        assert!(arena.check_integrity().is_ok());
    }

    #[test]
    fn parses_for_with_ifempty() {
        let (arena, reporter, _) = parse(
            r#"{namespace ns}
            {template .t}
              {@param items: list<string>}
              {for $item in $items}
                {$item}
              {ifempty}
                none
              {/for}
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
        assert!(arena.check_integrity().is_ok());
    }

    #[test]
    fn parses_call_with_params() {
        let (arena, reporter, _) = parse(
            r#"{namespace ns}
            {template .t}
              {call .other}
                {param x: 1 /}
                {param y kind="html"}<b>hi</b>{/param}
              {/call}
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
        assert!(arena.check_integrity().is_ok());
    }

    #[test]
    fn parses_switch_case_default() {
        let (arena, reporter, _) = parse(
            r#"{namespace ns}
            {template .t}
              {@param x: int}
              {switch $x}
                {case 1, 2}
                  low
                {default}
                  high
              {/switch}
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
        assert!(arena.check_integrity().is_ok());
    }

    #[test]
    fn inline_char_escapes_become_raw_text() {
        let (_, reporter, id) = parse(
            r#"{namespace ns}
            {template .t}
              a{sp}b{lb}c{rb}
            {/template}
            "#,
        );
        assert!(!reporter.has_errors());
        let _ = id;
    }

    #[test]
    fn unterminated_command_is_reported_not_panicked() {
        let (_, reporter, _) = parse(
            r#"{namespace ns}
            {template .t}
              {if $x
            "#,
        );
        assert!(reporter.has_errors());
    }
}
