use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MASK_BLUR_KERNEL_SIZE, DEFAULT_MASK_BLUR_SIGMA, DEFAULT_MASK_CLEANUP_KERNEL_SIZE,
    DEFAULT_MASK_GAIN, DEFAULT_MASK_HALO_ITERATIONS,
};

/// Tuning of the star mask after thresholding.
///
/// The defaults are empirically chosen visual targets rather than derived values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskParams {
    /// Side of the square element used for the opening/closing cleanup and halo dilation.
    #[serde(default = "default_cleanup_kernel_size")]
    pub cleanup_kernel_size: usize,
    /// Dilation passes that grow the mask over star halos.
    #[serde(default = "default_halo_dilation_iterations")]
    pub halo_dilation_iterations: usize,
    /// Gaussian kernel size (odd) used to feather the mask edges.
    #[serde(default = "default_blur_kernel_size")]
    pub blur_kernel_size: usize,
    /// Gaussian sigma used to feather the mask edges.
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    /// Multiplier applied after scaling to [0, 1], before clamping.
    #[serde(default = "default_gain")]
    pub gain: f32,
}

fn default_cleanup_kernel_size() -> usize {
    DEFAULT_MASK_CLEANUP_KERNEL_SIZE
}
fn default_halo_dilation_iterations() -> usize {
    DEFAULT_MASK_HALO_ITERATIONS
}
fn default_blur_kernel_size() -> usize {
    DEFAULT_MASK_BLUR_KERNEL_SIZE
}
fn default_blur_sigma() -> f32 {
    DEFAULT_MASK_BLUR_SIGMA
}
fn default_gain() -> f32 {
    DEFAULT_MASK_GAIN
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            cleanup_kernel_size: DEFAULT_MASK_CLEANUP_KERNEL_SIZE,
            halo_dilation_iterations: DEFAULT_MASK_HALO_ITERATIONS,
            blur_kernel_size: DEFAULT_MASK_BLUR_KERNEL_SIZE,
            blur_sigma: DEFAULT_MASK_BLUR_SIGMA,
            gain: DEFAULT_MASK_GAIN,
        }
    }
}
