//! Lexer/Parser (C2, spec.md §4.2).
//!
//! Three interleaved grammars feed one `Arena`: the command grammar
//! (`soy`, this module's namesake submodule) recognises `{…}` tags and the
//! HTML structure between them, delegating to `expr` for every expression
//! operand and to `ty` for every type annotation. Errors never abort parsing
//! — a bad command is reported and skipped so the rest of the file set
//! still yields diagnostics in one pass (spec.md §4.2 "errors do not throw").

pub mod expr;
pub mod soy;
pub mod ty;

pub use soy::parse_file;
