use ndarray::{Array2, ArrayView2};

/// Number of distinct 8-bit levels.
const LEVELS: usize = 256;

/// `p`-th percentile (0..=100) of 8-bit samples.
///
/// Linear interpolation between the two closest ranks, `rank = p / 100 * (n - 1)`.
/// Returns 0.0 for an empty input.
pub fn percentile(data: ArrayView2<'_, u8>, p: f64) -> f64 {
    let n = data.len();
    if n == 0 {
        return 0.0;
    }

    let mut histogram = [0usize; LEVELS];
    for &v in data.iter() {
        histogram[v as usize] += 1;
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lo_val = value_at_rank(&histogram, lo) as f64;
    let hi_val = value_at_rank(&histogram, hi) as f64;
    lo_val + (hi_val - lo_val) * (rank - lo as f64)
}

/// The value at 0-based position `rank` in the sorted samples.
fn value_at_rank(histogram: &[usize; LEVELS], rank: usize) -> u8 {
    let mut cumulative = 0usize;
    for (level, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative > rank {
            return level as u8;
        }
    }
    u8::MAX
}

/// Binarize: 255 where the sample is strictly above `threshold`, 0 elsewhere.
pub fn binarize(data: ArrayView2<'_, u8>, threshold: f64) -> Array2<u8> {
    data.mapv(|v| if v as f64 > threshold { u8::MAX } else { 0 })
}
