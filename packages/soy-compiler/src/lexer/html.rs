//! Raw-text HTML tokenizer (spec.md §3.2, §4.2), grounded in the teacher's
//! `ml_parser::tokens` token-type taxonomy, trimmed to the tag/attribute/
//! text/comment subset a Soy template surface needs — no i18n expansion
//! forms, Angular blocks, or component tags.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    TagOpenStart,
    TagOpenEnd,
    TagOpenEndVoid,
    TagClose,
    Text,
    AttrName,
    AttrEquals,
    AttrValueText,
    CommentStart,
    CommentEnd,
    Eof,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub token_type: TokenType,
    pub text: String,
}

impl Token {
    fn new(start: usize, end: usize, token_type: TokenType, text: impl Into<String>) -> Self {
        Token {
            start,
            end,
            token_type,
            text: text.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == TokenType::Eof
    }
}

/// Tokenizer state: whether we're inside a tag's attribute list, where `<`
/// and `>` lose their structural meaning inside quoted attribute values
/// (spec.md §4.2; mirrors `ml_parser::lexer`'s internal mode stack, reduced
/// to the two modes Soy markup actually needs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Tag,
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    input: &'a str,
    pos: usize,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            input,
            pos: 0,
            mode: Mode::Text,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let eof = tok.is_eof();
            tokens.push(tok);
            if eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn starts_with(&self, needle: &str) -> bool {
        let needle_chars: Vec<char> = needle.chars().collect();
        if self.pos + needle_chars.len() > self.chars.len() {
            return false;
        }
        self.chars[self.pos..self.pos + needle_chars.len()] == needle_chars[..]
    }

    fn next_token(&mut self) -> Token {
        let Some(c) = self.peek() else {
            return Token::new(self.pos, self.pos, TokenType::Eof, "");
        };

        match self.mode {
            Mode::Text => self.scan_text_mode(c),
            Mode::Tag => self.scan_tag_mode(c),
        }
    }

    fn scan_text_mode(&mut self, c: char) -> Token {
        let start = self.pos;
        if self.starts_with("<!--") {
            self.pos += 4;
            return Token::new(start, self.pos, TokenType::CommentStart, "<!--");
        }
        if self.starts_with("-->") {
            self.pos += 3;
            return Token::new(start, self.pos, TokenType::CommentEnd, "-->");
        }
        if c == '<' && matches!(self.peek_at(1), Some('/')) {
            self.pos += 2;
            let name_start = self.pos;
            while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '-' || ch == ':') {
                self.pos += 1;
            }
            let name: String = self.chars[name_start..self.pos].iter().collect();
            if self.peek() == Some('>') {
                self.pos += 1;
            }
            return Token::new(start, self.pos, TokenType::TagClose, name);
        }
        if c == '<' && matches!(self.peek_at(1), Some(ch) if ch.is_alphabetic()) {
            self.pos += 1;
            let name_start = self.pos;
            while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '-' || ch == ':') {
                self.pos += 1;
            }
            let name: String = self.chars[name_start..self.pos].iter().collect();
            self.mode = Mode::Tag;
            return Token::new(start, self.pos, TokenType::TagOpenStart, name);
        }
        // Plain text: runs until the next `<` or end of input.
        while matches!(self.peek(), Some(ch) if ch != '<') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Token::new(start, self.pos, TokenType::Text, text)
    }

    fn scan_tag_mode(&mut self, c: char) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
        let Some(c) = self.peek() else {
            return Token::new(self.pos, self.pos, TokenType::Eof, "");
        };
        let start = start.max(self.pos);
        let _ = c;
        match self.peek() {
            Some('/') if self.peek_at(1) == Some('>') => {
                self.pos += 2;
                self.mode = Mode::Text;
                Token::new(start, self.pos, TokenType::TagOpenEndVoid, "/>")
            }
            Some('>') => {
                self.pos += 1;
                self.mode = Mode::Text;
                Token::new(start, self.pos, TokenType::TagOpenEnd, ">")
            }
            Some('=') => {
                self.pos += 1;
                Token::new(start, self.pos, TokenType::AttrEquals, "=")
            }
            Some(q) if q == '"' || q == '\'' => {
                self.pos += 1;
                let value_start = self.pos;
                while matches!(self.peek(), Some(ch) if ch != q) {
                    self.pos += 1;
                }
                let value: String = self.chars[value_start..self.pos].iter().collect();
                if self.peek() == Some(q) {
                    self.pos += 1;
                }
                Token::new(start, self.pos, TokenType::AttrValueText, value)
            }
            Some(ch) if ch.is_alphabetic() || ch == '-' || ch == ':' => {
                let name_start = self.pos;
                while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '-' || ch == ':') {
                    self.pos += 1;
                }
                let name: String = self.chars[name_start..self.pos].iter().collect();
                Token::new(start, self.pos, TokenType::AttrName, name)
            }
            Some(_) => {
                self.pos += 1;
                Token::new(start, self.pos, TokenType::AttrName, "")
            }
            None => Token::new(self.pos, self.pos, TokenType::Eof, ""),
        }
    }

    pub fn source(&self) -> &'a str {
        self.input
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
