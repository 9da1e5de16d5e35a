use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use tracing::{debug, info};

use crate::composite::composite;
use crate::erosion::{erode_selective, precondition};
use crate::error::Result;
use crate::image::ImageBuffer;
use crate::io::fits::read_fits;
use crate::io::image_io::{derive_output_path, save_blended, save_buffer, save_mask};
use crate::mask::build_star_mask;
use crate::normalize::normalize;

use super::config::{OutputConfig, PipelineConfig};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter, StarReduction};

/// Run the star-reduction pipeline on a raw array.
pub fn reduce_stars(raw: &ArrayD<f32>, config: &PipelineConfig) -> Result<StarReduction> {
    reduce_stars_reported(raw, config, &NoOpReporter)
}

/// Run the star-reduction pipeline on a raw array with a progress reporter.
pub fn reduce_stars_reported(
    raw: &ArrayD<f32>,
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<StarReduction> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::Normalizing, None);
    let normalized = normalize(raw, config.flat_channel)?;
    reporter.finish_stage();

    reduce_normalized(normalized, config, reporter)
}

/// Run the pipeline on an already normalized working image.
pub fn reduce_image(normalized: ImageBuffer, config: &PipelineConfig) -> Result<StarReduction> {
    config.validate()?;
    reduce_normalized(normalized, config, &NoOpReporter)
}

fn reduce_normalized(
    normalized: ImageBuffer,
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<StarReduction> {
    let preconditioned = if config.pre_erosion_pass {
        reporter.begin_stage(PipelineStage::Preconditioning, None);
        let pre = precondition(&normalized, config.pre_pass_kernel_size);
        reporter.finish_stage();
        Some(pre)
    } else {
        None
    };
    let working = preconditioned.as_ref().unwrap_or(&normalized);

    // Mask and erosion both read the working image and nothing else.
    reporter.begin_stage(PipelineStage::MaskAndErode, None);
    let (mask, eroded) = rayon::join(
        || build_star_mask(working, config.threshold_percentile, &config.mask),
        || {
            erode_selective(
                working,
                config.kernel_size,
                config.erosion_iterations,
                config.erosion_mode,
            )
        },
    );
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Compositing, None);
    let blended = composite(working, &eroded, &mask)?;
    reporter.finish_stage();

    info!(
        width = working.width(),
        height = working.height(),
        channels = working.channels(),
        pre_pass = config.pre_erosion_pass,
        "Star reduction complete"
    );

    Ok(StarReduction {
        normalized,
        preconditioned,
        mask,
        eroded,
        blended,
    })
}

/// Read one FITS file, reduce its stars and write the artifacts into
/// `output_dir`. Returns the path of the blended output.
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    pipeline: &PipelineConfig,
    output: &OutputConfig,
) -> Result<PathBuf> {
    process_file_reported(input, output_dir, pipeline, output, &NoOpReporter)
}

/// [`process_file`] with a progress reporter.
pub fn process_file_reported(
    input: &Path,
    output_dir: &Path,
    pipeline: &PipelineConfig,
    output: &OutputConfig,
    reporter: &dyn ProgressReporter,
) -> Result<PathBuf> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let raw = read_fits(input)?;
    reporter.finish_stage();
    info!(
        file = %input.display(),
        shape = ?raw.data.shape(),
        hdu = raw.hdu_index,
        "Read FITS image"
    );

    let result = reduce_stars_reported(&raw.data, pipeline, reporter)?;
    drop(raw);

    reporter.begin_stage(PipelineStage::Writing, None);
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    let saved = write_outputs(input, output_dir, &result, output, &mut written);
    if saved.is_err() {
        // Leave nothing behind for a failed item.
        for path in &written {
            let _ = std::fs::remove_file(path);
        }
    }
    reporter.finish_stage();
    saved
}

fn write_outputs(
    input: &Path,
    output_dir: &Path,
    result: &StarReduction,
    output: &OutputConfig,
    written: &mut Vec<PathBuf>,
) -> Result<PathBuf> {
    let format = output.format;

    if output.save_intermediates {
        let path = derive_output_path(input, output_dir, "_original", format);
        save_buffer(&result.normalized, &path, format)?;
        written.push(path);

        if let Some(ref pre) = result.preconditioned {
            let path = derive_output_path(input, output_dir, "_preconditioned", format);
            save_buffer(pre, &path, format)?;
            written.push(path);
        }

        let path = derive_output_path(input, output_dir, "_mask", format);
        save_mask(&result.mask, &path, format)?;
        written.push(path);

        let path = derive_output_path(input, output_dir, "_eroded", format);
        save_buffer(&result.eroded, &path, format)?;
        written.push(path);
        debug!(count = written.len(), "Wrote intermediate buffers");
    }

    let path = derive_output_path(input, output_dir, &output.suffix, format);
    save_blended(&result.blended, &path, output.mode, format)?;
    written.push(path.clone());
    Ok(path)
}
