pub mod batch;
pub mod composite;
pub mod consts;
pub mod erosion;
pub mod error;
pub mod filters;
pub mod image;
pub mod io;
pub mod mask;
pub mod morphology;
pub mod normalize;
pub mod pipeline;
