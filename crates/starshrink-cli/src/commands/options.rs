use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use starshrink_core::erosion::ErosionMode;
use starshrink_core::io::image_io::{OutputFormat, OutputMode};
use starshrink_core::normalize::FlatChannelPolicy;
use starshrink_core::pipeline::BatchConfig;
use tracing::debug;

#[derive(Clone, Copy, ValueEnum)]
pub enum FlatChannelArg {
    MidGray,
    Zero,
    Reject,
}

impl From<FlatChannelArg> for FlatChannelPolicy {
    fn from(arg: FlatChannelArg) -> Self {
        match arg {
            FlatChannelArg::MidGray => FlatChannelPolicy::MidGray,
            FlatChannelArg::Zero => FlatChannelPolicy::Zero,
            FlatChannelArg::Reject => FlatChannelPolicy::Reject,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Png,
    Tiff,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Tiff => OutputFormat::Tiff,
        }
    }
}

/// Processing flags shared by `reduce` and `batch`.
///
/// Flags given on the command line override values loaded from `--config`.
#[derive(Args)]
pub struct ProcessingArgs {
    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Erosion kernel size in pixels (odd) [default: 5]
    #[arg(short, long)]
    pub kernel: Option<usize>,

    /// Number of erosion passes [default: 1]
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Brightness percentile above which pixels count as stars [default: 88]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Run a global erosion + dilation pass before masking
    #[arg(long)]
    pub pre_erosion: bool,

    /// Follow the erosion with a dilation (morphological opening)
    #[arg(long)]
    pub opening: bool,

    /// What to do with channels that have a single value [default: mid-gray]
    #[arg(long, value_enum)]
    pub flat_channel: Option<FlatChannelArg>,

    /// Clamp the blend to 0..255 instead of stretching it
    #[arg(long)]
    pub clamp: bool,

    /// Output raster format [default: png]
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Suffix appended to the input name [default: _processed]
    #[arg(long)]
    pub suffix: Option<String>,

    /// Also write the normalized original, mask and eroded images
    #[arg(long)]
    pub save_intermediates: bool,
}

impl ProcessingArgs {
    /// Build the run configuration from `--config` (if any) and the flags.
    pub fn resolve(&self) -> Result<BatchConfig> {
        let mut config: BatchConfig = if let Some(ref path) = self.config {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            BatchConfig::default()
        };

        let pipeline = &mut config.pipeline;
        if let Some(k) = self.kernel {
            pipeline.kernel_size = k;
        }
        if let Some(n) = self.iterations {
            pipeline.erosion_iterations = n;
        }
        if let Some(t) = self.threshold {
            pipeline.threshold_percentile = t;
        }
        if self.pre_erosion {
            pipeline.pre_erosion_pass = true;
        }
        if self.opening {
            pipeline.erosion_mode = ErosionMode::Opening;
        }
        if let Some(policy) = self.flat_channel {
            pipeline.flat_channel = policy.into();
        }

        let output = &mut config.output;
        if self.clamp {
            output.mode = OutputMode::Clamped;
        }
        if let Some(format) = self.format {
            output.format = format.into();
        }
        if let Some(ref suffix) = self.suffix {
            if suffix.contains(['/', '\\']) {
                bail!("--suffix must not contain path separators: {suffix:?}");
            }
            output.suffix = suffix.clone();
        }
        if self.save_intermediates {
            output.save_intermediates = true;
        }

        config
            .pipeline
            .validate()
            .context("Invalid processing parameters")?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }
}
