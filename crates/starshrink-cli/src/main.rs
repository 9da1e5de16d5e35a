mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starshrink", about = "Star reduction for astronomical FITS images")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce the stars of a single FITS file
    Reduce(commands::reduce::ReduceArgs),
    /// Reduce every FITS file in a directory and write a report
    Batch(commands::batch::BatchArgs),
    /// Show FITS header metadata
    Info(commands::info::InfoArgs),
    /// Print or save a configuration file (defaults plus any flags)
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Reduce(args) => commands::reduce::run(args),
        Commands::Batch(args) => commands::batch::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
