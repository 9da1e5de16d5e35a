pub mod config;
mod orchestrator;
mod types;

pub use config::{BatchConfig, OutputConfig, PipelineConfig};
pub use orchestrator::{
    process_file, process_file_reported, reduce_image, reduce_stars, reduce_stars_reported,
};
pub use types::{NoOpReporter, PipelineStage, ProgressReporter, StarReduction};
