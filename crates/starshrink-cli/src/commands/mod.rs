pub mod batch;
pub mod config;
pub mod info;
pub mod options;
pub mod reduce;
