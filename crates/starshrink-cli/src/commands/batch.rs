use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use starshrink_core::batch::run_batch_reported;

use super::options::ProcessingArgs;
use crate::progress::BarReporter;

#[derive(Args)]
pub struct BatchArgs {
    /// Directory containing FITS files
    #[arg(short, long, default_value = ".")]
    pub input: PathBuf,

    /// Output directory for images and the report
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub processing: ProcessingArgs,
}

pub fn run(args: &BatchArgs) -> Result<()> {
    let mut config = args.processing.resolve()?;
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            bail!("--jobs must be at least 1");
        }
        config.jobs = Some(jobs);
    }
    crate::summary::print_config_summary(&config, &args.input, &args.output);

    let reporter = BarReporter::new()?;
    let result = run_batch_reported(&args.input, &args.output, &config, &reporter);
    reporter.finish();

    let report = result
        .with_context(|| format!("Batch over {} failed", args.input.display()))?;
    crate::summary::print_batch_report(&report);

    if report.success_count() == 0 {
        bail!("No file could be processed");
    }
    Ok(())
}
