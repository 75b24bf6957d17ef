//! # magpie-cli
//!
//! Remote build-artifact cache action binary.
//!
//! The runner invokes the binary twice per job: `magpie main` restores the
//! cached build output before the build, `magpie post` saves it afterwards.
//! Any unhandled failure in either phase is printed with the fixed `[magpie]`
//! prefix and turns into a non-zero exit; graceful skips exit 0.

use clap::{Parser, ValueEnum};
use tracing::info;

use magpie_core::error::{MagpieError, MagpieResult};

mod output;
mod phases;

/// Remote build cache for CI pipelines
#[derive(Parser)]
#[command(name = "magpie", version, about = "Remote build cache for CI pipelines")]
pub struct Cli {
    /// Phase to run
    #[arg(value_enum, default_value = "main")]
    pub phase: Phase,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    /// Restore the cache before the build
    Main,
    /// Save the cache after the build
    Post,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(error) = run_cli(&cli) {
        eprintln!("[magpie] {}", error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("[magpie] {}", suggestion);
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: &Cli) -> MagpieResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| MagpieError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        info!(
            "Starting magpie v{} ({:?} phase)",
            env!("CARGO_PKG_VERSION"),
            cli.phase
        );
        phases::run(cli.phase).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "magpie={},magpie_core={},magpie_service={}",
            level, level, level
        ))
        .with_target(false)
        .init();
}
