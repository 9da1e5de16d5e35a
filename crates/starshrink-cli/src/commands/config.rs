use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::options::ProcessingArgs;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker threads to record in the config
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub processing: ProcessingArgs,
}

/// Print or save a BatchConfig as TOML: the defaults, adjusted by any
/// processing flags or a `--config` base file.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let mut config = args.processing.resolve()?;
    config.jobs = args.jobs.or(config.jobs);
    let toml_str = toml::to_string_pretty(&config).context("Cannot serialize config")?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &toml_str)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Config saved to {}", path.display());
        }
        None => print!("{toml_str}"),
    }
    Ok(())
}
