/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of channels in a color image (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Maximum value of the 8-bit working representation.
pub const WORKING_MAX: f32 = 255.0;

/// Value assigned to every pixel of a flat channel under the mid-gray policy.
pub const FLAT_CHANNEL_MID_GRAY: u8 = 128;

/// Default side of the square erosion element.
pub const DEFAULT_KERNEL_SIZE: usize = 5;

/// Default number of erosion passes.
pub const DEFAULT_EROSION_ITERATIONS: usize = 1;

/// Default brightness percentile above which pixels count as stars.
pub const DEFAULT_THRESHOLD_PERCENTILE: f64 = 88.0;

/// Side of the element used by the optional global pre-conditioning pass.
pub const DEFAULT_PRE_PASS_KERNEL_SIZE: usize = 5;

/// Side of the element used to clean up the binary star mask.
pub const DEFAULT_MASK_CLEANUP_KERNEL_SIZE: usize = 3;

/// Dilation passes applied to the cleaned mask to cover star halos.
pub const DEFAULT_MASK_HALO_ITERATIONS: usize = 2;

/// Gaussian kernel size used to soften the star mask edges.
pub const DEFAULT_MASK_BLUR_KERNEL_SIZE: usize = 9;

/// Gaussian sigma used to soften the star mask edges.
pub const DEFAULT_MASK_BLUR_SIGMA: f32 = 1.5;

/// Gain applied to the blurred mask before clamping to [0, 1].
/// Empirically tuned, not derived.
pub const DEFAULT_MASK_GAIN: f32 = 1.4;

/// Suffix appended to the input stem when naming the blended output.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_processed";

/// File name of the persisted batch report.
pub const BATCH_REPORT_FILE_NAME: &str = "batch_report.txt";

/// FITS logical record size in bytes.
pub const FITS_BLOCK_SIZE: usize = 2880;

/// FITS header card size in bytes.
pub const FITS_CARD_SIZE: usize = 80;

/// File extensions (lowercase) recognised as FITS during batch discovery.
pub const FITS_EXTENSIONS: [&str; 3] = ["fits", "fit", "fts"];
