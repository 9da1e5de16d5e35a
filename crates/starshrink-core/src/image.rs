use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;

use crate::consts::{COLOR_CHANNEL_COUNT, LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, WORKING_MAX};
use crate::error::{Result, StarShrinkError};

/// An 8-bit working image.
/// Pixel values are u8 in [0, 255], channel-last.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    /// Pixel data, shape = (height, width, channels) with channels 1 or 3.
    pub data: Array3<u8>,
}

impl ImageBuffer {
    /// Wrap a channel-last array. Fails unless the channel count is 1 or 3.
    pub fn new(data: Array3<u8>) -> Result<Self> {
        let (h, w, c) = data.dim();
        if c != 1 && c != COLOR_CHANNEL_COUNT {
            return Err(StarShrinkError::UnsupportedShape(vec![h, w, c]));
        }
        Ok(Self { data })
    }

    /// Build a single-channel image from a 2D array.
    pub fn from_mono(data: Array2<u8>) -> Self {
        Self {
            data: data.insert_axis(Axis(2)),
        }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn is_color(&self) -> bool {
        self.channels() == COLOR_CHANNEL_COUNT
    }

    /// Borrow one channel as a 2D view.
    pub fn channel(&self, index: usize) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(2), index)
    }

    /// Single-channel luma (ITU-R BT.601 weights, rounded). Mono images are copied.
    pub fn to_luma(&self) -> Array2<u8> {
        if !self.is_color() {
            return self.channel(0).to_owned();
        }
        let (h, w, _) = self.data.dim();
        Array2::from_shape_fn((h, w), |(row, col)| {
            let y = LUMINANCE_R * self.data[[row, col, 0]] as f32
                + LUMINANCE_G * self.data[[row, col, 1]] as f32
                + LUMINANCE_B * self.data[[row, col, 2]] as f32;
            y.round().min(WORKING_MAX) as u8
        })
    }

    /// Apply a per-channel transform and reassemble the result.
    /// Channels are processed in parallel.
    pub fn map_channels<F>(&self, process_fn: F) -> Self
    where
        F: Fn(ArrayView2<'_, u8>) -> Array2<u8> + Sync + Send,
    {
        let planes: Vec<Array2<u8>> = (0..self.channels())
            .into_par_iter()
            .map(|c| process_fn(self.channel(c)))
            .collect();
        let mut out = Array3::<u8>::zeros(self.data.dim());
        for (c, plane) in planes.iter().enumerate() {
            out.index_axis_mut(Axis(2), c).assign(plane);
        }
        Self { data: out }
    }
}

/// Soft star mask. Values are f32 in [0.0, 1.0], shape = (height, width).
///
/// 1.0 takes the eroded pixel, 0.0 keeps the original one.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub data: Array2<f32>,
}

impl Mask {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// True when no pixel carries any weight.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }
}

/// Floating-point compositing result, shape = (height, width, channels).
/// Values nominally lie in [0.0, 255.0].
#[derive(Clone, Debug, PartialEq)]
pub struct BlendedImage {
    pub data: Array3<f32>,
}

impl BlendedImage {
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// Clamp to [0, 255] and truncate to the 8-bit working type.
    pub fn to_u8_clamped(&self) -> ImageBuffer {
        ImageBuffer {
            data: self.data.mapv(|v| v.clamp(0.0, WORKING_MAX) as u8),
        }
    }
}
