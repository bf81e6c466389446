//! Pass Manager (C5) and Semantic Passes (C6), spec.md §4.5–§4.6.
//!
//! Passes run in a fixed order — parse, imports, types, name resolution,
//! check-calls, check-params, conformance, optimise, autoescape,
//! desugar-html, final-lowering (spec.md §4.5) — each one free to emit
//! diagnostics but not to change that order. [`PassManager`] only owns the
//! ordering and the shared [`ErrorReporter`]; each pass is a plain function
//! over the arena so it stays independently testable.

mod check_calls;
mod check_params;
mod conformance;

pub use check_calls::check_calls;
pub use check_params::check_template_params;
pub use conformance::{check_mixed_param_styles, check_non_empty_msg};

use crate::diagnostics::ErrorReporter;

/// The fixed pipeline order a [`PassManager`] walks (spec.md §4.5). Each
/// variant names a pass group for `ErrorReporter::end_pass` bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Parse,
    Imports,
    Types,
    NameResolution,
    CheckCalls,
    CheckParams,
    Conformance,
    Optimise,
    Autoescape,
    DesugarHtml,
    FinalLowering,
}

impl PassKind {
    pub const ORDER: [PassKind; 11] = [
        PassKind::Parse,
        PassKind::Imports,
        PassKind::Types,
        PassKind::NameResolution,
        PassKind::CheckCalls,
        PassKind::CheckParams,
        PassKind::Conformance,
        PassKind::Optimise,
        PassKind::Autoescape,
        PassKind::DesugarHtml,
        PassKind::FinalLowering,
    ];
}

/// Drives a compilation through [`PassKind::ORDER`], stopping early if a
/// pass left errors in the shared [`ErrorReporter`] (spec.md §4.5: "a pass
/// with errors blocks every pass after it, but diagnostics from earlier
/// passes are still reported in full").
pub struct PassManager<'a> {
    reporter: &'a mut ErrorReporter,
}

impl<'a> PassManager<'a> {
    pub fn new(reporter: &'a mut ErrorReporter) -> Self {
        PassManager { reporter }
    }

    /// Runs one pass, tagging its diagnostics with `kind` and stable-sorting
    /// them before returning whether the pipeline should continue.
    pub fn run<F: FnOnce(&mut ErrorReporter)>(&mut self, kind: PassKind, f: F) -> bool {
        tracing::debug!(pass = ?kind, "running pass");
        f(self.reporter);
        self.reporter.end_pass();
        !self.reporter.has_errors()
    }
}
