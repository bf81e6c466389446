//! Drives `soy_compiler::Compiler` over a discovered file set, formats its
//! diagnostics to stderr, and maps the result to the process exit code
//! spec.md §6.3 / SPEC_FULL.md §6.4 define: 0 success, 1 diagnostics
//! reported (but the compile otherwise ran to completion), 2 cancellation,
//! 3 internal failure. `CompilerArtefact::exit_code` (0/1/2 clean/warn/error)
//! is the artefact's own summary of *its* diagnostics; this module layers
//! the CLI-level 0..=3 scheme on top, since a CLI run can also fail before
//! ever producing an artefact (bad `--project` path, unreadable source).

use std::path::Path;

use soy_compiler::source::SourceProvider;
use soy_compiler::{Compiler, CompilerArtefact};
use tracing::{error, info, warn};

use crate::compile::parallel::discover_and_warm;
use crate::config::SoyConfig;

/// CLI-level exit codes (spec.md §6.3).
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;
pub const EXIT_CANCELLED: i32 = 2;
pub const EXIT_INTERNAL_FAILURE: i32 = 3;

pub struct CompileOptions {
    pub project: String,
    pub output_dir: Option<String>,
}

/// Reads `{project}/soy.json` if present (CLI flags always win over it),
/// discovers and parallel-warms every `.soy` file under its source roots,
/// runs the full pipeline, prints diagnostics, and returns the exit code.
pub fn perform_compilation(options: &CompileOptions) -> i32 {
    let project_root = Path::new(&options.project);

    let config = match project_root.join("soy.json").exists() {
        true => match SoyConfig::load(&project_root.join("soy.json")) {
            Ok(c) => c,
            Err(e) => {
                error!(%e, "failed to load soy.json");
                eprintln!("error: {e}");
                return EXIT_INTERNAL_FAILURE;
            }
        },
        false => SoyConfig::default(),
    };

    let provider = match discover_and_warm(project_root, &config.source_roots) {
        Ok(p) => p,
        Err(e) => {
            error!(%e, "file discovery failed");
            eprintln!("error: {e}");
            return EXIT_INTERNAL_FAILURE;
        }
    };

    if provider.paths().is_empty() {
        warn!("no .soy files found under {}", options.project);
    }
    info!(file_count = provider.paths().len(), "starting compile");

    let artefact = Compiler::new(&provider).compile();

    print_diagnostics(&artefact, &provider);

    if artefact.has_errors() {
        return EXIT_DIAGNOSTICS;
    }

    match emit_artefact(&artefact, options.output_dir.as_deref()) {
        Ok(()) => {
            if artefact.has_warnings() {
                EXIT_DIAGNOSTICS
            } else {
                EXIT_SUCCESS
            }
        }
        Err(e) => {
            error!(%e, "failed writing artefact output");
            eprintln!("error: {e}");
            EXIT_INTERNAL_FAILURE
        }
    }
}

fn print_diagnostics(artefact: &CompilerArtefact, provider: &dyn SourceProvider) {
    for diag in &artefact.diagnostics {
        eprintln!("{}", diag.contextual_message(provider));
    }
}

/// Writes the artefact's diagnostics as JSON — the only thing this CLI
/// emits, since target-language code generation is an external
/// collaborator's job (spec.md §1, §4.10; SPEC_FULL.md §6.4). A richer
/// backend would serialize `artefact.arena`/`template_registry` too; this
/// one limits itself to what's directly actionable from a terminal.
fn emit_artefact(artefact: &CompilerArtefact, output_dir: Option<&str>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&artefact.diagnostics)?;
    match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            std::fs::write(Path::new(dir).join("diagnostics.json"), json)?;
        }
        None => println!("{json}"),
    }
    Ok(())
}
