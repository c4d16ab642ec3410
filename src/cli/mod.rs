//! Command-line interface for cella-stats
//!
//! Provides `load` and `inspect` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod inspect;
mod load;
mod utils;

const EXIT_CODES: &str = "Exit codes: 0 success, 1 other failure, 2 invalid command line, \
3 source read error, 4 database error, 5 configuration error";

/// Load daily Cella statistics into the warehouse database
#[derive(Parser)]
#[command(name = "cella-stats")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = EXIT_CODES)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the reports and forecast, merge them and write the batch
    Load(Box<load::LoadArgs>),

    /// Show the headers and shape of a source file
    Inspect(inspect::InspectArgs),
}

pub fn run() -> Result<()> {
    // Variables from .env act as environment for clap's `env` fallbacks.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring .env: {}", e),
    }

    match cli.command {
        Commands::Load(args) => load::run(*args),
        Commands::Inspect(args) => inspect::run(args),
    }
}
