use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_EROSION_ITERATIONS, DEFAULT_KERNEL_SIZE, DEFAULT_OUTPUT_SUFFIX,
    DEFAULT_PRE_PASS_KERNEL_SIZE, DEFAULT_THRESHOLD_PERCENTILE,
};
use crate::erosion::ErosionMode;
use crate::error::{Result, StarShrinkError};
use crate::io::image_io::{OutputFormat, OutputMode};
use crate::mask::MaskParams;
use crate::normalize::FlatChannelPolicy;

/// Parameters of one star-reduction run. Shared unchanged by every item of a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Side of the square erosion element (odd).
    #[serde(default = "default_kernel_size")]
    pub kernel_size: usize,
    /// Number of erosion passes.
    #[serde(default = "default_erosion_iterations")]
    pub erosion_iterations: usize,
    /// Brightness percentile in (0, 100) above which pixels count as stars.
    #[serde(default = "default_threshold_percentile")]
    pub threshold_percentile: f64,
    /// Run a global erosion + dilation over the whole image before anything else.
    #[serde(default)]
    pub pre_erosion_pass: bool,
    /// Element side for the global pre-pass (odd).
    #[serde(default = "default_pre_pass_kernel_size")]
    pub pre_pass_kernel_size: usize,
    #[serde(default)]
    pub erosion_mode: ErosionMode,
    #[serde(default)]
    pub flat_channel: FlatChannelPolicy,
    #[serde(default)]
    pub mask: MaskParams,
}

fn default_kernel_size() -> usize {
    DEFAULT_KERNEL_SIZE
}
fn default_erosion_iterations() -> usize {
    DEFAULT_EROSION_ITERATIONS
}
fn default_threshold_percentile() -> f64 {
    DEFAULT_THRESHOLD_PERCENTILE
}
fn default_pre_pass_kernel_size() -> usize {
    DEFAULT_PRE_PASS_KERNEL_SIZE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            erosion_iterations: DEFAULT_EROSION_ITERATIONS,
            threshold_percentile: DEFAULT_THRESHOLD_PERCENTILE,
            pre_erosion_pass: false,
            pre_pass_kernel_size: DEFAULT_PRE_PASS_KERNEL_SIZE,
            erosion_mode: ErosionMode::default(),
            flat_channel: FlatChannelPolicy::default(),
            mask: MaskParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        check_odd_kernel("kernel_size", self.kernel_size)?;
        check_odd_kernel("pre_pass_kernel_size", self.pre_pass_kernel_size)?;
        check_odd_kernel("mask.cleanup_kernel_size", self.mask.cleanup_kernel_size)?;
        check_odd_kernel("mask.blur_kernel_size", self.mask.blur_kernel_size)?;

        if self.erosion_iterations == 0 {
            return Err(StarShrinkError::InvalidConfig(
                "erosion_iterations must be at least 1".into(),
            ));
        }
        let p = self.threshold_percentile;
        if !(p > 0.0 && p < 100.0) {
            return Err(StarShrinkError::InvalidConfig(format!(
                "threshold_percentile must lie in (0, 100), got {p}"
            )));
        }
        if !(self.mask.blur_sigma > 0.0) {
            return Err(StarShrinkError::InvalidConfig(format!(
                "mask.blur_sigma must be positive, got {}",
                self.mask.blur_sigma
            )));
        }
        if !(self.mask.gain > 0.0) {
            return Err(StarShrinkError::InvalidConfig(format!(
                "mask.gain must be positive, got {}",
                self.mask.gain
            )));
        }
        Ok(())
    }
}

fn check_odd_kernel(name: &str, size: usize) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(StarShrinkError::InvalidConfig(format!(
            "{name} must be a positive odd integer, got {size}"
        )));
    }
    Ok(())
}

/// How results are written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,
    #[serde(default)]
    pub format: OutputFormat,
    /// Appended to the input stem for the blended output.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Also write the normalized original, mask and eroded buffers.
    #[serde(default)]
    pub save_intermediates: bool,
}

fn default_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            format: OutputFormat::default(),
            suffix: default_suffix(),
            save_intermediates: false,
        }
    }
}

/// Everything a batch run needs besides the directories.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads; `None` uses one per core.
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}
