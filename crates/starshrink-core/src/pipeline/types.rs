use crate::image::{BlendedImage, ImageBuffer, Mask};

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PipelineStage {
    Reading,
    Normalizing,
    Preconditioning,
    MaskAndErode,
    Compositing,
    Writing,
    Processing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading FITS"),
            Self::Normalizing => write!(f, "Normalizing"),
            Self::Preconditioning => write!(f, "Pre-conditioning"),
            Self::MaskAndErode => write!(f, "Masking and eroding"),
            Self::Compositing => write!(f, "Compositing"),
            Self::Writing => write!(f, "Writing output"),
            Self::Processing => write!(f, "Processing files"),
        }
    }
}

/// Every buffer produced by one pipeline run.
#[derive(Clone, Debug)]
pub struct StarReduction {
    /// Working image straight out of the normalizer.
    pub normalized: ImageBuffer,
    /// Result of the global pre-pass, when enabled. Mask and erosion start from it.
    pub preconditioned: Option<ImageBuffer>,
    pub mask: Mask,
    pub eroded: ImageBuffer,
    pub blended: BlendedImage,
}

impl StarReduction {
    /// The buffer the mask and erosion were computed from.
    pub fn working(&self) -> &ImageBuffer {
        self.preconditioned.as_ref().unwrap_or(&self.normalized)
    }
}

/// Receives pipeline progress from worker threads.
///
/// Every method defaults to doing nothing, so a reporter only overrides what
/// it displays.
pub trait ProgressReporter: Send + Sync {
    /// `stage` started. `total_items` is set when the stage works through a
    /// known number of items, such as files in a batch.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

/// Reporter that discards every event.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
