pub mod config;
pub mod threshold;

pub use config::MaskParams;

use tracing::debug;

use crate::consts::WORKING_MAX;
use crate::filters::gaussian_blur::gaussian_blur_array;
use crate::image::{ImageBuffer, Mask};
use crate::morphology::{closing, dilate, opening};

use threshold::{binarize, percentile};

/// Build the soft star mask of `image`.
///
/// 1. Reduce to luma (color) or take the single channel.
/// 2. Foreground = pixels strictly above the `threshold_percentile`-th percentile.
/// 3. Opening, then closing, with the cleanup element (one pass each).
/// 4. Dilate `halo_dilation_iterations` times.
/// 5. Gaussian blur, scale to [0, 1], apply `gain`, clamp.
///
/// An image with no pixel above the threshold yields an all-zero mask.
pub fn build_star_mask(image: &ImageBuffer, threshold_percentile: f64, params: &MaskParams) -> Mask {
    let gray = image.to_luma();
    let threshold = percentile(gray.view(), threshold_percentile);
    let binary = binarize(gray.view(), threshold);
    let foreground = binary.iter().filter(|&&v| v > 0).count();

    let k = params.cleanup_kernel_size;
    let opened = opening(binary.view(), k, 1);
    let cleaned = closing(opened.view(), k, 1);
    let grown = dilate(cleaned.view(), k, params.halo_dilation_iterations);

    let blurred = gaussian_blur_array(
        &grown.mapv(|v| v as f32),
        params.blur_kernel_size,
        params.blur_sigma,
    );
    let gain = params.gain;
    let data = blurred.mapv(|v| (v / WORKING_MAX * gain).clamp(0.0, 1.0));

    debug!(
        threshold,
        percentile = threshold_percentile,
        foreground,
        "Built star mask"
    );
    Mask::new(data)
}
