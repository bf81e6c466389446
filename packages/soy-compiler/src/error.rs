//! Internal / control-flow errors.
//!
//! These are distinct from [`crate::diagnostics::Diagnostic`]: a diagnostic is
//! *data* produced by a pass that keeps running (an unused param, a type
//! mismatch). A `CompilerError` aborts the pass (or the whole compile)
//! outright because continuing would mean operating on missing or
//! inconsistent state.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("source file not found: {0}")]
    SourceNotFound(String),

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("proto descriptor collision for '{fqn}': defined in both {path_a} and {path_b}")]
    ProtoCollision {
        fqn: String,
        path_a: String,
        path_b: String,
    },

    #[error("duplicate template '{0}' in file set")]
    DuplicateTemplate(String),

    #[error("recursive template '{0}' could not reach a fixed-point context")]
    RecursiveTemplateCannotContextualise(String),

    #[error("compilation was interrupted")]
    Interrupted,

    #[error("internal assertion failed: {0}")]
    AssertionFailure(String),
}
