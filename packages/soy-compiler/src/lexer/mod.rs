//! Tokenizers (spec.md §4.1 "Lexer/Parser").
//!
//! Two lexers feed two distinct grammars that get interleaved by the
//! command parser: [`expr`] tokenizes the expression language (`$var`,
//! literals, operators), [`html`] tokenizes raw template text into HTML
//! structure tokens the way the teacher's `ml_parser` does.

pub mod expr;
pub mod html;
