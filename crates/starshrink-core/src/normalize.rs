use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2, Ix3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{COLOR_CHANNEL_COUNT, FLAT_CHANNEL_MID_GRAY, WORKING_MAX};
use crate::error::{Result, StarShrinkError};
use crate::image::ImageBuffer;

/// What to emit for a channel whose finite values are all equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FlatChannelPolicy {
    /// Fill the channel with mid-gray (128).
    #[default]
    MidGray,
    /// Fill the channel with black.
    Zero,
    /// Fail with `DegenerateNormalization`.
    Reject,
}

impl std::fmt::Display for FlatChannelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MidGray => write!(f, "Mid-gray"),
            Self::Zero => write!(f, "Zero"),
            Self::Reject => write!(f, "Reject"),
        }
    }
}

/// Map a raw array of arbitrary dynamic range to the 8-bit working image.
///
/// Accepts (H, W), (H, W, 3) and (3, H, W). Leading singleton plane axes and a
/// trailing singleton channel axis are dropped, so (1, H, W) and (H, W, 1)
/// read as monochrome. When the first axis has length 3 the array is taken as
/// channel-first and transposed.
///
/// Each channel is stretched independently from its own [min, max] to
/// [0, 255] and truncated. Non-finite samples are ignored for the range and
/// written as 0.
pub fn normalize(raw: &ArrayD<f32>, policy: FlatChannelPolicy) -> Result<ImageBuffer> {
    let original_shape = raw.shape().to_vec();
    let mut view: ArrayViewD<'_, f32> = raw.view();

    while view.ndim() > 2 && view.shape()[0] == 1 {
        view = view.index_axis_move(Axis(0), 0);
    }
    if view.ndim() == 3 && view.shape()[2] == 1 {
        view = view.index_axis_move(Axis(2), 0);
    }

    match view.ndim() {
        2 => {
            let mono = view
                .into_dimensionality::<Ix2>()
                .map_err(|_| StarShrinkError::UnsupportedShape(original_shape.clone()))?;
            if mono.is_empty() {
                return Err(StarShrinkError::UnsupportedShape(original_shape));
            }
            let data = normalize_channel(mono, 0, policy)?;
            debug!(height = data.nrows(), width = data.ncols(), "Normalized mono image");
            Ok(ImageBuffer::from_mono(data))
        }
        3 => {
            let cube = view
                .into_dimensionality::<Ix3>()
                .map_err(|_| StarShrinkError::UnsupportedShape(original_shape.clone()))?;
            let channel_last: ArrayView3<'_, f32> = if cube.shape()[0] == COLOR_CHANNEL_COUNT {
                cube.permuted_axes([1, 2, 0])
            } else if cube.shape()[2] == COLOR_CHANNEL_COUNT {
                cube
            } else {
                return Err(StarShrinkError::UnsupportedShape(original_shape));
            };
            if channel_last.is_empty() {
                return Err(StarShrinkError::UnsupportedShape(original_shape));
            }

            let (h, w, c) = channel_last.dim();
            let mut data = Array3::<u8>::zeros((h, w, c));
            for ch in 0..c {
                let plane = normalize_channel(channel_last.index_axis(Axis(2), ch), ch, policy)?;
                data.index_axis_mut(Axis(2), ch).assign(&plane);
            }
            debug!(height = h, width = w, "Normalized color image");
            ImageBuffer::new(data)
        }
        _ => Err(StarShrinkError::UnsupportedShape(original_shape)),
    }
}

/// Finite (min, max) of a channel, or `None` when it has no finite sample.
pub fn finite_range(channel: ArrayView2<'_, f32>) -> Option<(f32, f32)> {
    channel
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn normalize_channel(
    channel: ArrayView2<'_, f32>,
    index: usize,
    policy: FlatChannelPolicy,
) -> Result<Array2<u8>> {
    let range = finite_range(channel).filter(|(lo, hi)| hi > lo);

    let Some((min, max)) = range else {
        return match policy {
            FlatChannelPolicy::MidGray => {
                warn!(channel = index, "Flat channel, filling with mid-gray");
                Ok(Array2::from_elem(channel.dim(), FLAT_CHANNEL_MID_GRAY))
            }
            FlatChannelPolicy::Zero => {
                warn!(channel = index, "Flat channel, filling with zero");
                Ok(Array2::zeros(channel.dim()))
            }
            FlatChannelPolicy::Reject => {
                Err(StarShrinkError::DegenerateNormalization { channel: index })
            }
        };
    };

    let min = min as f64;
    let span = max as f64 - min;
    Ok(channel.mapv(|v| {
        if v.is_finite() {
            ((v as f64 - min) / span * WORKING_MAX as f64) as u8
        } else {
            0
        }
    }))
}
