#![deny(clippy::all)]

//! The external collaborator spec.md §1 and §4.10 leave out of the compiler
//! core: argument parsing, `soy.json` loading, driving `soy_compiler::Compiler`
//! over a discovered file set, formatting diagnostics, and mapping the result
//! to a process exit code (spec.md §6.3). Never reaches into `soy_compiler`'s
//! private modules — only its public `Compiler`/`CompilerArtefact` surface.

pub use soy_compiler as compiler;

pub mod compile;
pub mod config;
pub mod perform_compile;
pub mod version;

/// CLI version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
