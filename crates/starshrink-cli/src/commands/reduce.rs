use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use starshrink_core::pipeline::process_file_reported;

use super::options::ProcessingArgs;
use crate::progress::BarReporter;

#[derive(Args)]
pub struct ReduceArgs {
    /// Input FITS file
    pub file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    #[command(flatten)]
    pub processing: ProcessingArgs,
}

pub fn run(args: &ReduceArgs) -> Result<()> {
    let config = args.processing.resolve()?;
    crate::summary::print_config_summary(&config, &args.file, &args.output);

    let reporter = BarReporter::new()?;
    let result = process_file_reported(
        &args.file,
        &args.output,
        &config.pipeline,
        &config.output,
        &reporter,
    );
    reporter.finish();

    let path = result.with_context(|| format!("Failed to process {}", args.file.display()))?;
    println!("Saved to {}", path.display());
    Ok(())
}
