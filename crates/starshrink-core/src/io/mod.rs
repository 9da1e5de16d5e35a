pub mod fits;
pub mod image_io;

pub use fits::{read_fits, FitsHeader, FitsReader, RawImage};
pub use image_io::{OutputFormat, OutputMode};
