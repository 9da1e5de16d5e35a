use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer as RasterBuffer, ImageFormat, Luma, Rgb};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::consts::{EPSILON, WORKING_MAX};
use crate::error::{Result, StarShrinkError};
use crate::image::{BlendedImage, ImageBuffer, Mask};

/// How the floating-point blend is brought into display range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum OutputMode {
    /// Min-max stretch of the blended values to [0, 1].
    #[default]
    Normalized,
    /// Clamp to [0, 255] without stretching.
    Clamped,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normalized => write!(f, "Normalized"),
            Self::Clamped => write!(f, "Clamped"),
        }
    }
}

/// Raster container written for each artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// 8-bit PNG.
    #[default]
    Png,
    /// 16-bit TIFF.
    Tiff,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tiff => "tiff",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG (8-bit)"),
            Self::Tiff => write!(f, "TIFF (16-bit)"),
        }
    }
}

/// Build `<output_dir>/<input stem><suffix>.<ext>`.
pub fn derive_output_path(
    input: &Path,
    output_dir: &Path,
    suffix: &str,
    format: OutputFormat,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{stem}{suffix}.{}", format.extension()))
}

/// Save the blended result.
pub fn save_blended(
    image: &BlendedImage,
    path: &Path,
    mode: OutputMode,
    format: OutputFormat,
) -> Result<()> {
    if mode == OutputMode::Clamped && format == OutputFormat::Png {
        return save_buffer(&image.to_u8_clamped(), path, format);
    }
    let unit = unit_range(&image.data, mode);
    let (h, w, c) = image.data.dim();
    write_unit(&unit, w, h, c, path, format)
}

/// Save an 8-bit working buffer as-is.
pub fn save_buffer(image: &ImageBuffer, path: &Path, format: OutputFormat) -> Result<()> {
    let (h, w, c) = image.data.dim();
    match format {
        OutputFormat::Png => {
            let pixels: Vec<u8> = image.data.iter().copied().collect();
            let img = if c == 1 {
                DynamicImage::ImageLuma8(raster::<Luma<u8>, u8>(w, h, pixels)?)
            } else {
                DynamicImage::ImageRgb8(raster::<Rgb<u8>, u8>(w, h, pixels)?)
            };
            write_atomic(&img, path, format)
        }
        OutputFormat::Tiff => {
            let unit: Vec<f32> = image.data.iter().map(|&v| v as f32 / WORKING_MAX).collect();
            write_unit(&unit, w, h, c, path, format)
        }
    }
}

/// Save the star mask as a grayscale image (1.0 = white).
pub fn save_mask(mask: &Mask, path: &Path, format: OutputFormat) -> Result<()> {
    let unit: Vec<f32> = mask.data.iter().map(|&v| v.clamp(0.0, 1.0)).collect();
    write_unit(&unit, mask.width(), mask.height(), 1, path, format)
}

/// Map blended values to [0, 1] according to `mode`, in row-major interleaved order.
pub fn unit_range(data: &Array3<f32>, mode: OutputMode) -> Vec<f32> {
    match mode {
        OutputMode::Clamped => data
            .iter()
            .map(|&v| v.clamp(0.0, WORKING_MAX) / WORKING_MAX)
            .collect(),
        OutputMode::Normalized => {
            let (min, max) = data
                .iter()
                .filter(|v| v.is_finite())
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            let range = max - min;
            let range = if !range.is_finite() || range.abs() < EPSILON {
                1.0
            } else {
                range
            };
            let min = if min.is_finite() { min } else { 0.0 };
            data.iter()
                .map(|&v| ((v - min) / range).clamp(0.0, 1.0))
                .collect()
        }
    }
}

fn write_unit(
    unit: &[f32],
    w: usize,
    h: usize,
    channels: usize,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let img = match format {
        OutputFormat::Png => {
            let pixels: Vec<u8> = unit.iter().map(|&v| (v * 255.0).round() as u8).collect();
            if channels == 1 {
                DynamicImage::ImageLuma8(raster::<Luma<u8>, u8>(w, h, pixels)?)
            } else {
                DynamicImage::ImageRgb8(raster::<Rgb<u8>, u8>(w, h, pixels)?)
            }
        }
        OutputFormat::Tiff => {
            let pixels: Vec<u16> = unit.iter().map(|&v| (v * 65535.0).round() as u16).collect();
            if channels == 1 {
                DynamicImage::ImageLuma16(raster::<Luma<u16>, u16>(w, h, pixels)?)
            } else {
                DynamicImage::ImageRgb16(raster::<Rgb<u16>, u16>(w, h, pixels)?)
            }
        }
    };
    write_atomic(&img, path, format)
}

fn raster<P, S>(w: usize, h: usize, pixels: Vec<S>) -> Result<RasterBuffer<P, Vec<S>>>
where
    P: image::Pixel<Subpixel = S>,
{
    let len = pixels.len();
    RasterBuffer::from_raw(w as u32, h as u32, pixels).ok_or(StarShrinkError::ShapeMismatch {
        expected: (h, w, P::CHANNEL_COUNT as usize),
        actual: (len, 1, 1),
    })
}

/// Encode into a temporary file next to `path` and rename it into place.
/// A failed write leaves no artifact at `path`.
fn write_atomic(img: &DynamicImage, path: &Path, format: OutputFormat) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut writer, format.image_format())?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
