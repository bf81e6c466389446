//! Autoescaper / Context Inference Engine (C9, spec.md §4.9).
//!
//! The hardest subsystem in the pipeline: given a strict template's
//! declared `content_kind`, walks its body tracking an HTML/CSS/JS/URI
//! [`Context`], merging branch exits, converging recursive calls to a
//! fixed point, and deciding which escaping directive each `{print}` needs.

pub mod context;
pub mod derive;
pub mod directives;
pub mod inferences;
pub mod transitions;

pub use context::Context;
pub use derive::ContextualAnalyzer;
pub use directives::{directive_named, directives_for_context, EscapeDirective};
pub use inferences::Inferences;
