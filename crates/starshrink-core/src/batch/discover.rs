use std::path::{Path, PathBuf};

use crate::consts::FITS_EXTENSIONS;
use crate::error::Result;

/// True when `path` has a FITS extension (`.fits`, `.fit`, `.fts`, any case).
pub fn is_fits_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            FITS_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// List the FITS files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_fits_path(&path) {
            inputs.push(path);
        }
    }
    inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(inputs)
}
