pub mod discover;
pub mod report;

pub use discover::{discover_inputs, is_fits_path};
pub use report::{render_report, write_report};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, StarShrinkError};
use crate::pipeline::{
    process_file, BatchConfig, NoOpReporter, PipelineStage, ProgressReporter,
};

/// Result of processing one input.
#[derive(Clone, Debug, PartialEq)]
pub enum OutcomeStatus {
    /// Path of the blended output.
    Success(PathBuf),
    /// Human-readable cause of the failure.
    Failure(String),
}

/// One input file and what became of it.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessingOutcome {
    pub input: PathBuf,
    pub status: OutcomeStatus,
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success(_))
    }

    /// Input file name without its directory.
    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

/// Aggregated outcome of a batch run.
#[derive(Clone, Debug)]
pub struct BatchReport {
    pub config: BatchConfig,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// One entry per input, in discovery order.
    pub outcomes: Vec<ProcessingOutcome>,
    /// Where the text report was written.
    pub report_path: PathBuf,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total() - self.success_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessingOutcome> + '_ {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Process every FITS file in `input_dir`, writing results and
/// `batch_report.txt` into `output_dir`.
pub fn run_batch(input_dir: &Path, output_dir: &Path, config: &BatchConfig) -> Result<BatchReport> {
    run_batch_reported(input_dir, output_dir, config, &NoOpReporter)
}

/// [`run_batch`] with a progress reporter, advanced once per finished file.
///
/// A failing file is recorded as [`OutcomeStatus::Failure`] and never stops
/// the batch. Errors returned here concern the batch as a whole: invalid
/// configuration, unreadable input directory, no inputs, or an unwritable
/// report.
pub fn run_batch_reported(
    input_dir: &Path,
    output_dir: &Path,
    config: &BatchConfig,
    reporter: &dyn ProgressReporter,
) -> Result<BatchReport> {
    config.pipeline.validate()?;
    if config.jobs == Some(0) {
        return Err(StarShrinkError::InvalidConfig(
            "jobs must be at least 1".into(),
        ));
    }

    let inputs = discover_inputs(input_dir)?;
    if inputs.is_empty() {
        return Err(StarShrinkError::NoInputs(input_dir.to_path_buf()));
    }
    std::fs::create_dir_all(output_dir)?;

    info!(
        files = inputs.len(),
        input = %input_dir.display(),
        output = %output_dir.display(),
        "Starting batch"
    );

    let clashes = output_name_clashes(&inputs);

    reporter.begin_stage(PipelineStage::Processing, Some(inputs.len()));
    let done = AtomicUsize::new(0);
    let run = || -> Vec<ProcessingOutcome> {
        inputs
            .par_iter()
            .zip(clashes.par_iter())
            .map(|(input, clash)| {
                let outcome = match clash {
                    Some(first) => skip_clash(input, first),
                    None => process_one(input, output_dir, config),
                };
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.advance(finished);
                outcome
            })
            .collect()
    };
    let outcomes = match config.jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| StarShrinkError::InvalidConfig(format!("thread pool: {e}")))?
            .install(run),
        None => run(),
    };
    reporter.finish_stage();

    let mut report = BatchReport {
        config: config.clone(),
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        outcomes,
        report_path: PathBuf::new(),
    };
    report.report_path = write_report(&report, output_dir)?;

    info!(
        total = report.total(),
        succeeded = report.success_count(),
        failed = report.failure_count(),
        report = %report.report_path.display(),
        "Batch complete"
    );
    Ok(report)
}

/// For each input, the earlier input whose output names it would reuse.
///
/// Outputs are named after the file stem, so `m31.fit` and `m31.fits` map to
/// the same files. Stems compare case-insensitively. The first input in
/// discovery order keeps the name.
fn output_name_clashes(inputs: &[PathBuf]) -> Vec<Option<PathBuf>> {
    let mut claimed: HashMap<String, &PathBuf> = HashMap::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            match claimed.get(&stem) {
                Some(first) => Some((*first).clone()),
                None => {
                    claimed.insert(stem, input);
                    None
                }
            }
        })
        .collect()
}

fn skip_clash(input: &Path, first: &Path) -> ProcessingOutcome {
    let first_name = first
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    warn!(file = %input.display(), clashes_with = %first.display(), "Skipped");
    ProcessingOutcome {
        input: input.to_path_buf(),
        status: OutcomeStatus::Failure(format!(
            "output names collide with {first_name}, which was processed instead"
        )),
    }
}

fn process_one(input: &Path, output_dir: &Path, config: &BatchConfig) -> ProcessingOutcome {
    let status = match process_file(input, output_dir, &config.pipeline, &config.output) {
        Ok(path) => {
            info!(file = %input.display(), output = %path.display(), "Processed");
            OutcomeStatus::Success(path)
        }
        Err(e) => {
            warn!(file = %input.display(), error = %e, "Failed");
            OutcomeStatus::Failure(e.to_string())
        }
    };
    ProcessingOutcome {
        input: input.to_path_buf(),
        status,
    }
}
