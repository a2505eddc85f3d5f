//! Smelter CLI - inspect resolved package graphs.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("smelter=debug")
    } else {
        EnvFilter::new("smelter=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Flags(args) => commands::flags::execute(args),
        Commands::Resolve(args) => commands::resolve::execute(args),
        Commands::Chain(args) => commands::chain::execute(args),
    }
}
