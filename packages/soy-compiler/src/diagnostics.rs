//! The `ErrorReporter` every pass reports through (spec.md §4.6, §6.3, §7).
//!
//! A diagnostic is data, not a `Result::Err` — passes keep running after
//! reporting one so the compiler can surface many problems per compile
//! (spec.md §4.2 "errors do not throw").

use serde::{Deserialize, Serialize};

use crate::node::SourceLocation;
use crate::source::SourceProvider;

/// Abstract labels from the taxonomy in spec.md §7. Not Rust type names —
/// just tags carried on a `Diagnostic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    // Syntax
    ParseError,
    UnterminatedCommand,
    UnexpectedToken,
    // Resolution
    UnknownTemplate,
    UnknownType,
    UnknownFunction,
    UnknownParameter,
    DuplicateTemplate,
    // Typing
    TypeMismatch,
    CrossKindStrictCall,
    NullableInNonNullContext,
    // Flow
    BranchContextMismatch,
    LoopRepeatsInDifferentContext,
    StrictBlockEndMismatch,
    // Autoescape
    IllegalRecontextualisation,
    TrustedResourceUriDynamicScheme,
    MessageChangesContext,
    RecursiveTemplateCannotContextualise,
    // Semantic passes
    UnusedParam,
    UndeclaredDataKey,
    EmptyMsg,
    DuplicateDeclaration,
    MixedParamStyles,
    // Conformance
    Conformance,
    // Internal
    DescriptorCollision,
    AssertionFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(location: SourceLocation, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            location,
            kind,
            severity: Severity::Error,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(location: SourceLocation, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            location,
            kind,
            severity: Severity::Warning,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Renders a `before[ERROR ->]after` snippet around the offending span,
    /// mirroring the teacher's `ParseError::contextual_message` convention
    /// (spec.md SPEC_FULL.md §4.12).
    pub fn contextual_message(&self, provider: &dyn SourceProvider) -> String {
        let Ok(text) = provider.get(&self.location.path) else {
            return self.message.clone();
        };
        let lines: Vec<&str> = text.lines().collect();
        let line_idx = self.location.start_line as usize;
        let line = lines.get(line_idx.saturating_sub(1)).copied().unwrap_or("");
        let col = self.location.start_col as usize;
        let (before, after) = line.split_at(col.min(line.len()));
        let level = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        let mut out = format!("{} (\"{}[{} ->]{}\")", self.message, before, level, after);
        if let Some(hint) = &self.hint {
            out.push_str(&format!(" ({hint})"));
        }
        out
    }
}

/// Accumulates `(location, kind, args)` triples, in pass order, and within a
/// pass in source-location order (spec.md §5).
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    /// Index in `diagnostics` at the start of the currently-running pass;
    /// used to stable-sort only this pass's new entries by location before
    /// moving on to the next pass.
    pass_start: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            tracing::error!(kind = ?diagnostic.kind, message = %diagnostic.message, "diagnostic");
        } else {
            tracing::warn!(kind = ?diagnostic.kind, message = %diagnostic.message, "diagnostic");
        }
        self.diagnostics.push(diagnostic);
    }

    /// Sorts the diagnostics reported since the last call by
    /// `(path, start-line, start-col)`, stable so node-id order (insertion
    /// order within a line/col) breaks remaining ties, then closes out the
    /// pass. Called once by the Pass Manager after every pass (spec.md §5).
    pub fn end_pass(&mut self) {
        self.diagnostics[self.pass_start..]
            .sort_by(|a, b| a.location.sort_key().cmp(&b.location.sort_key()));
        self.pass_start = self.diagnostics.len();
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
