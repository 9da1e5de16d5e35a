use indicatif::{ProgressBar, ProgressStyle};
use starshrink_core::pipeline::{PipelineStage, ProgressReporter};

/// Drives a single terminal progress bar from pipeline callbacks.
pub struct BarReporter {
    bar: ProgressBar,
    counted: ProgressStyle,
    stage: ProgressStyle,
}

impl BarReporter {
    pub fn new() -> anyhow::Result<Self> {
        let counted = ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> ");
        let stage = ProgressStyle::default_spinner().template("{spinner} {msg}")?;
        Ok(Self {
            bar: ProgressBar::new(0),
            counted,
            stage,
        })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        match total_items {
            Some(n) => {
                self.bar.set_style(self.counted.clone());
                self.bar.set_length(n as u64);
                self.bar.set_position(0);
            }
            None => self.bar.set_style(self.stage.clone()),
        }
        self.bar.set_message(stage.to_string());
        self.bar.tick();
    }

    fn advance(&self, _items_done: usize) {
        // Items finish on worker threads in any order.
        self.bar.inc(1);
    }
}
