//! Expression-language lexer (spec.md §3.2, §4.1), grounded in the teacher's
//! `expression_parser::lexer` token-struct shape (`TokenType` + `Token` with
//! `index`/`end`/`num_value`/`str_value`), generalised to Soy's sigil-led
//! variable syntax and operator set.

use serde::{Deserialize, Serialize};

use crate::chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Variable,
    Identifier,
    Keyword,
    String,
    Operator,
    Number,
    Eof,
    Error,
}

const KEYWORDS: &[&str] = &["null", "true", "false", "and", "or", "not", "for", "in", "if"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub token_type: TokenType,
    pub num_value: f64,
    pub str_value: String,
}

impl Token {
    fn new(start: usize, end: usize, token_type: TokenType, str_value: impl Into<String>) -> Self {
        Token {
            start,
            end,
            token_type,
            num_value: 0.0,
            str_value: str_value.into(),
        }
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.token_type == TokenType::Operator && self.str_value == op
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        self.token_type == TokenType::Keyword && self.str_value == kw
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == TokenType::Eof
    }
}

/// Two- and three-character operators must be tried before their one-char
/// prefixes (`?.` before `?`, `??` before `?`, `<=` before `<`).
const MULTI_CHAR_OPERATORS: &[&str] = &["?.", "?[", "??", "==", "!=", "<=", ">=", "&&", "||"];

pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Token::new(start, start, TokenType::Eof, "");
        };

        if chars::is_dollar(c) {
            return self.scan_variable(start);
        }
        if c.is_ascii_digit() || (c == '.' && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit())) {
            return self.scan_number(start);
        }
        if c.is_alphabetic() || c == '_' {
            return self.scan_identifier_or_keyword(start);
        }
        if c == '"' || c == '\'' {
            return self.scan_string(start, c);
        }
        for op in MULTI_CHAR_OPERATORS {
            if self.input_starts_with_at(start, op) {
                self.pos += op.chars().count();
                return Token::new(start, self.pos, TokenType::Operator, *op);
            }
        }
        self.advance();
        Token::new(start, self.pos, TokenType::Operator, c.to_string())
    }

    fn input_starts_with_at(&self, start: usize, needle: &str) -> bool {
        let needle_chars: Vec<char> = needle.chars().collect();
        if start + needle_chars.len() > self.chars.len() {
            return false;
        }
        self.chars[start..start + needle_chars.len()] == needle_chars[..]
    }

    fn scan_variable(&mut self, start: usize) -> Token {
        self.advance(); // the `$`
        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[name_start..self.pos].iter().collect();
        Token::new(start, self.pos, TokenType::Variable, name)
    }

    fn scan_number(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let mut tok = Token::new(start, self.pos, TokenType::Number, text.clone());
        tok.num_value = text.parse().unwrap_or(f64::NAN);
        tok
    }

    fn scan_identifier_or_keyword(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '.') {
            // `.` is only part of the identifier for dotted globals / proto
            // enum references (`pkg.MyProto.FIELD`); the parser, not the
            // lexer, disambiguates field access from a dotted name, so we
            // only swallow `.` here when followed directly by another
            // identifier char.
            if self.peek() == Some('.') {
                match self.peek_at(1) {
                    Some(d) if d.is_alphabetic() || d == '_' => {}
                    _ => break,
                }
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let token_type = if KEYWORDS.contains(&text.as_str()) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };
        Token::new(start, self.pos, token_type, text)
    }

    fn scan_string(&mut self, start: usize, quote: char) -> Token {
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Token::new(start, self.pos, TokenType::Error, "unterminated string"),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => other,
                        });
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        Token::new(start, self.pos, TokenType::String, value)
    }
}

/// Convenience wrapper so callers don't construct a `Lexer` directly.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenType> {
        tokenize(src).into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn tokenizes_a_variable() {
        let tokens = tokenize("$foo");
        assert_eq!(tokens[0].token_type, TokenType::Variable);
        assert_eq!(tokens[0].str_value, "foo");
        assert!(tokens[1].is_eof());
    }

    #[test]
    fn tokenizes_null_safe_and_coalesce_operators() {
        let tokens = tokenize("$a?.b ?? $c");
        assert!(tokens.iter().any(|t| t.is_operator("?.")));
        assert!(tokens.iter().any(|t| t.is_operator("??")));
    }

    #[test]
    fn tokenizes_float_and_int_literals() {
        let tokens = tokenize("1 1.5 .5 1e10");
        let nums: Vec<f64> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Number)
            .map(|t| t.num_value)
            .collect();
        assert_eq!(nums, vec![1.0, 1.5, 0.5, 1e10]);
    }

    #[test]
    fn tokenizes_string_literal_with_escapes() {
        let tokens = tokenize(r#""a\nb""#);
        assert_eq!(tokens[0].token_type, TokenType::String);
        assert_eq!(tokens[0].str_value, "a\nb");
    }

    #[test]
    fn keywords_are_distinguished_from_identifiers() {
        assert_eq!(kinds("null true false and or not")[..6], [TokenType::Keyword; 6]);
        assert_eq!(kinds("foo")[0], TokenType::Identifier);
    }

    #[test]
    fn dotted_proto_enum_name_is_one_identifier_token() {
        let tokens = tokenize("pkg.MyProto.FIELD");
        assert_eq!(tokens[0].token_type, TokenType::Identifier);
        assert_eq!(tokens[0].str_value, "pkg.MyProto.FIELD");
    }
}
