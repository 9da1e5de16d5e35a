use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::consts::BATCH_REPORT_FILE_NAME;
use crate::error::Result;

use super::{BatchReport, OutcomeStatus};

const RULE_WIDTH: usize = 60;

/// Render the plain-text batch report.
///
/// A parameter block, the totals, then two lines per input:
/// `<file name> : <Success|Failure>` and `  -> <output file | error message>`.
pub fn render_report(report: &BatchReport) -> String {
    let pipeline = &report.config.pipeline;
    let output = &report.config.output;
    let rule = "=".repeat(RULE_WIDTH);
    let thin_rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str("Star Reduction Batch Report\n");
    out.push_str(&rule);
    out.push_str("\n\n");

    out.push_str("Parameters:\n");
    out.push_str(&format!(
        "  - Pre-erosion pass : {}\n",
        if pipeline.pre_erosion_pass {
            format!(
                "enabled ({k}x{k})",
                k = pipeline.pre_pass_kernel_size
            )
        } else {
            "disabled".to_string()
        }
    ));
    out.push_str(&format!(
        "  - Kernel : {k}x{k}\n",
        k = pipeline.kernel_size
    ));
    out.push_str(&format!("  - Iterations : {}\n", pipeline.erosion_iterations));
    out.push_str(&format!("  - Threshold : {}%\n", pipeline.threshold_percentile));
    out.push_str(&format!("  - Erosion mode : {}\n", pipeline.erosion_mode));
    out.push_str(&format!("  - Flat channels : {}\n", pipeline.flat_channel));
    out.push_str(&format!(
        "  - Mask : cleanup {c}x{c}, halo x{h}, blur {b}x{b} sigma {s}, gain {g}\n",
        c = pipeline.mask.cleanup_kernel_size,
        h = pipeline.mask.halo_dilation_iterations,
        b = pipeline.mask.blur_kernel_size,
        s = pipeline.mask.blur_sigma,
        g = pipeline.mask.gain,
    ));
    out.push_str(&format!(
        "  - Output : {}, {}\n\n",
        output.format, output.mode
    ));

    out.push_str("Results:\n");
    out.push_str(&format!("  - Total : {}\n", report.total()));
    out.push_str(&format!("  - Success : {}\n", report.success_count()));
    out.push_str(&format!("  - Failure : {}\n\n", report.failure_count()));

    out.push_str("Per-file details:\n");
    out.push_str(&thin_rule);
    out.push('\n');
    for outcome in &report.outcomes {
        let name = outcome.file_name();
        match &outcome.status {
            OutcomeStatus::Success(path) => {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                out.push_str(&format!("{name} : Success\n"));
                out.push_str(&format!("  -> {file}\n"));
            }
            OutcomeStatus::Failure(message) => {
                out.push_str(&format!("{name} : Failure\n"));
                out.push_str(&format!("  -> {message}\n"));
            }
        }
    }

    out
}

/// Write the rendered report to `<output_dir>/batch_report.txt` atomically.
pub fn write_report(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(BATCH_REPORT_FILE_NAME);
    let mut tmp = NamedTempFile::new_in(output_dir)?;
    tmp.write_all(render_report(report).as_bytes())?;
    tmp.flush()?;
    tmp.persist(&path).map_err(|e| e.error)?;
    Ok(path)
}
