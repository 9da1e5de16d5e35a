use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

#[derive(Clone, Copy, Debug)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn identity(self) -> u8 {
        match self {
            Self::Min => u8::MAX,
            Self::Max => u8::MIN,
        }
    }

    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        }
    }
}

/// Grayscale erosion with a `kernel_size` x `kernel_size` all-ones element,
/// applied `iterations` times.
///
/// Each pixel becomes the minimum of its neighborhood. The neighborhood is
/// clipped at the image border, so out-of-bounds pixels never darken the edge.
/// On a 0/255 image this is binary erosion.
pub fn erode(data: ArrayView2<'_, u8>, kernel_size: usize, iterations: usize) -> Array2<u8> {
    repeat(data, kernel_size, iterations, Extremum::Min)
}

/// Grayscale dilation: each pixel becomes the maximum of its neighborhood.
pub fn dilate(data: ArrayView2<'_, u8>, kernel_size: usize, iterations: usize) -> Array2<u8> {
    repeat(data, kernel_size, iterations, Extremum::Max)
}

/// Morphological opening: `iterations` erosions followed by as many dilations.
///
/// Removes bright features smaller than the element while roughly keeping the
/// outline of larger ones.
pub fn opening(data: ArrayView2<'_, u8>, kernel_size: usize, iterations: usize) -> Array2<u8> {
    let eroded = erode(data, kernel_size, iterations);
    dilate(eroded.view(), kernel_size, iterations)
}

/// Morphological closing: dilations followed by erosions. Fills small dark holes.
pub fn closing(data: ArrayView2<'_, u8>, kernel_size: usize, iterations: usize) -> Array2<u8> {
    let dilated = dilate(data, kernel_size, iterations);
    erode(dilated.view(), kernel_size, iterations)
}

fn repeat(
    data: ArrayView2<'_, u8>,
    kernel_size: usize,
    iterations: usize,
    op: Extremum,
) -> Array2<u8> {
    let radius = kernel_size / 2;
    let mut current = data.to_owned();
    if radius == 0 {
        return current;
    }
    for _ in 0..iterations {
        // A square element is separable: filter rows, then columns.
        let row_pass = filter_pass(current.view(), radius, Axis(1), op);
        current = filter_pass(row_pass.view(), radius, Axis(0), op);
    }
    current
}

fn filter_pass(data: ArrayView2<'_, u8>, radius: usize, axis: Axis, op: Extremum) -> Array2<u8> {
    let (h, w) = data.dim();
    let len = data.len_of(axis);
    let mut out = Array2::<u8>::zeros((h, w));

    let compute = |(row, col): (usize, usize), v: &mut u8| {
        let pos = if axis == Axis(0) { row } else { col };
        let lo = pos.saturating_sub(radius);
        let hi = (pos + radius).min(len - 1);
        let mut acc = op.identity();
        for i in lo..=hi {
            let sample = if axis == Axis(0) {
                data[[i, col]]
            } else {
                data[[row, i]]
            };
            acc = op.pick(acc, sample);
        }
        *v = acc;
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        Zip::indexed(&mut out).par_for_each(compute);
    } else {
        Zip::indexed(&mut out).for_each(compute);
    }
    out
}
