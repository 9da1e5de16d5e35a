use ndarray::{Array3, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, StarShrinkError};
use crate::image::{BlendedImage, ImageBuffer, Mask};

/// Alpha-blend the eroded image over the original: `F = M*E + (1 - M)*I`.
///
/// The mask is broadcast over channels. Evaluated as `I + M*(E - I)`, so
/// `M == 0` or `I == E` returns the original value exactly and every output
/// lies between the two inputs.
pub fn composite(original: &ImageBuffer, eroded: &ImageBuffer, mask: &Mask) -> Result<BlendedImage> {
    let dim = original.data.dim();
    if eroded.data.dim() != dim {
        return Err(StarShrinkError::ShapeMismatch {
            expected: dim,
            actual: eroded.data.dim(),
        });
    }
    let (h, w, _) = dim;
    if mask.data.dim() != (h, w) {
        return Err(StarShrinkError::ShapeMismatch {
            expected: (h, w, 1),
            actual: (mask.height(), mask.width(), 1),
        });
    }

    let weights = &mask.data;
    let blend = |(row, col, _): (usize, usize, usize), out: &mut f32, &i: &u8, &e: &u8| {
        let m = weights[[row, col]];
        let i = i as f32;
        *out = i + m * (e as f32 - i);
    };

    let mut data = Array3::<f32>::zeros(dim);
    let zip = Zip::indexed(&mut data).and(&original.data).and(&eroded.data);
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(blend);
    } else {
        zip.for_each(blend);
    }

    Ok(BlendedImage { data })
}
