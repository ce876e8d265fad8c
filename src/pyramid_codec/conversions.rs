//! Pipeline conversions module
//!
//! This module orchestrates image files through the pyramid codec: encode,
//! decode, on-disk round trips and whole directories.

mod pyramid_pipeline;
mod timing;


pub use pyramid_pipeline::{BatchSummary, CONTAINER_EXTENSION, PyramidPipeline, RoundTripReport};
pub use timing::{PipelineTimings, StepTiming, Timer};
