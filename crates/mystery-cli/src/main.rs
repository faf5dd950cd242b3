//! Mystery Art CLI - Generate and check artwork for mystery content packs

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, scan, validate, verify};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mystery-art")]
#[command(about = "Generate, verify and validate artwork for murder mystery packs", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate artwork for every matching descriptor
    Generate {
        /// Mystery id (directory under the mysteries path)
        mystery: String,

        /// Only assets of this type (location, character, clue)
        #[arg(long = "type")]
        asset_type: Option<String>,

        /// Only the asset with this id
        #[arg(long)]
        asset: Option<String>,

        /// Regenerate even when the output already exists
        #[arg(long)]
        force: bool,

        /// Print the prompts without calling any provider
        #[arg(long)]
        dry_run: bool,

        /// Provider to use (gemini, null)
        #[arg(long, default_value = "gemini")]
        provider: String,
    },

    /// List asset descriptors
    Scan {
        /// Mystery id
        mystery: String,

        /// Only descriptors with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Check that generated images exist with the declared size
    Validate {
        /// Mystery id
        mystery: String,
    },

    /// Re-run the vision check on existing images
    Verify {
        /// Mystery id
        mystery: String,

        /// Only the asset with this id
        #[arg(long)]
        asset: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate {
            mystery,
            asset_type,
            asset,
            force,
            dry_run,
            provider,
        } => generate::run(generate::GenerateArgs {
            mystery,
            asset_type,
            asset,
            force,
            dry_run,
            provider,
        }),
        Commands::Scan { mystery, status } => scan::run(&mystery, status.as_deref()),
        Commands::Validate { mystery } => validate::run(&mystery),
        Commands::Verify { mystery, asset } => verify::run(&mystery, asset.as_deref()),
    }
}
