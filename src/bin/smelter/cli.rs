//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Smelter - build-graph compiler for a source-based Linux distro
#[derive(Parser)]
#[command(name = "smelter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the effective USE flags of a package
    Flags(FlagsArgs),

    /// Resolve a package and print the snapshot as JSON
    Resolve(ResolveArgs),

    /// Print a package's transform chain description as JSON
    Chain(ChainArgs),
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Path to the package declaration (package.toml)
    pub package: PathBuf,

    /// Path to the profile with USE overrides
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Path to the package declaration (package.toml)
    pub package: PathBuf,

    /// Path to the profile with USE overrides
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Constraint values for the ambient configuration (AXIS=VALUE)
    #[arg(long = "set", value_name = "AXIS=VALUE")]
    pub set: Vec<String>,

    /// Apply a registered transition to the configuration first
    #[arg(long)]
    pub transition: Vec<String>,
}

#[derive(Args)]
pub struct ChainArgs {
    /// Path to the package declaration (package.toml)
    pub package: PathBuf,

    /// Path to the profile with USE overrides
    #[arg(long)]
    pub profile: Option<PathBuf>,
}
