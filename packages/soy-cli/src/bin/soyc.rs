//! `soyc` — the command-line front end for `soy-compiler` (SPEC_FULL.md §6.4).
//!
//! `soyc compile --project soy.json [--output-dir DIR] [--autoescape MODE] [-v]`

use clap::{Parser, Subcommand};

use soy_cli_host::perform_compile::{perform_compilation, CompileOptions};

#[derive(Parser)]
#[command(name = "soyc", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug-level logging (honors RUST_LOG too).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every `.soy` file under a project and report diagnostics.
    Compile {
        /// Directory containing `soy.json`, or the project root if absent.
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Write diagnostics JSON here instead of stdout.
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Overrides the project's default autoescape mode.
        #[arg(long)]
        autoescape: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let exit_code = match cli.command {
        Command::Compile { project, output_dir, autoescape: _ } => {
            perform_compilation(&CompileOptions { project, output_dir })
        }
    };

    std::process::exit(exit_code);
}
