use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::image::ImageBuffer;
use crate::morphology::{dilate, erode, opening};

/// Which morphological operator shrinks the stars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ErosionMode {
    /// Erosion only: strongest shrinking, star cores may leave dark pits.
    #[default]
    ErodeOnly,
    /// Erosion followed by one dilation pass with the same element, restoring
    /// some boundary detail.
    Opening,
}

impl std::fmt::Display for ErosionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ErodeOnly => write!(f, "Erode only"),
            Self::Opening => write!(f, "Opening"),
        }
    }
}

/// Produce the star-shrunk variant of `image`, channel by channel.
///
/// Erodes with a `kernel_size` square element `iterations` times; in
/// `Opening` mode one dilation pass with the same element follows.
pub fn erode_selective(
    image: &ImageBuffer,
    kernel_size: usize,
    iterations: usize,
    mode: ErosionMode,
) -> ImageBuffer {
    debug!(kernel_size, iterations, mode = %mode, "Selective erosion");
    image.map_channels(|channel| {
        let eroded = erode(channel, kernel_size, iterations);
        match mode {
            ErosionMode::ErodeOnly => eroded,
            ErosionMode::Opening => dilate(eroded.view(), kernel_size, 1),
        }
    })
}

/// Global pre-conditioning pass: one erosion and one dilation over the whole image.
pub fn precondition(image: &ImageBuffer, kernel_size: usize) -> ImageBuffer {
    debug!(kernel_size, "Global pre-conditioning pass");
    image.map_channels(|channel| opening(channel, kernel_size, 1))
}
