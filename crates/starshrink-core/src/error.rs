use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarShrinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("Unsupported image shape {0:?}: expected HxW, HxWx3 or 3xHxW")]
    UnsupportedShape(Vec<usize>),

    #[error("Channel {channel} has a flat value range, cannot normalize")]
    DegenerateNormalization { channel: usize },

    #[error("Buffer shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("No FITS files found in {}", .0.display())]
    NoInputs(PathBuf),
}

pub type Result<T> = std::result::Result<T, StarShrinkError>;
