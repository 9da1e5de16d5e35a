use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Apply Gaussian blur to a raw array using separable 1D convolution.
///
/// `kernel_size` is the tap count per axis (odd). Zero derives it from sigma
/// as `2 * ceil(3 * sigma) + 1`. Borders are mirrored without repeating the
/// edge sample (`dcb|abcd|cba`).
pub fn gaussian_blur_array(data: &Array2<f32>, kernel_size: usize, sigma: f32) -> Array2<f32> {
    let kernel = make_gaussian_kernel(kernel_size, sigma);
    let row_pass = convolve_rows(data, &kernel);
    convolve_cols(&row_pass, &kernel)
}

/// Normalized 1D Gaussian taps, centered on the middle sample.
pub fn make_gaussian_kernel(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let size = if kernel_size == 0 {
        2 * (sigma * 3.0).ceil() as usize + 1
    } else {
        kernel_size
    };
    let radius = (size / 2) as f32;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

/// Mirror an out-of-range index back into [0, len).
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

fn convolve_rows(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = (kernel.len() / 2) as isize;

    let compute_row = |row: usize| -> Vec<f32> {
        (0..w)
            .map(|col| {
                let mut sum = 0.0f32;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let src_col = reflect_101(col as isize + ki as isize - radius, w);
                    sum += data[[row, src_col]] * kv;
                }
                sum
            })
            .collect()
    };

    let rows: Vec<Vec<f32>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(compute_row).collect()
    } else {
        (0..h).map(compute_row).collect()
    };
    assemble(rows, h, w)
}

fn convolve_cols(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = (kernel.len() / 2) as isize;

    let compute_row = |row: usize| -> Vec<f32> {
        (0..w)
            .map(|col| {
                let mut sum = 0.0f32;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let src_row = reflect_101(row as isize + ki as isize - radius, h);
                    sum += data[[src_row, col]] * kv;
                }
                sum
            })
            .collect()
    };

    let rows: Vec<Vec<f32>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(compute_row).collect()
    } else {
        (0..h).map(compute_row).collect()
    };
    assemble(rows, h, w)
}

fn assemble(rows: Vec<Vec<f32>>, h: usize, w: usize) -> Array2<f32> {
    let mut result = Array2::<f32>::zeros((h, w));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }
    result
}
