//! Falcon CLI - sensor image resolution for the Falcon operator
//!
//! This is the main entry point for the falcon command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS connection is opened
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let global = cli.global_options();
    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Resolve(args) => commands::resolve::run(args, &global).await,
        Commands::Tags(args) => commands::tags::run(args, &global).await,
        Commands::Policy(args) => commands::policy::run(args, &global).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
