//! Resampling module
//!
//! This module provides the interpolation kernels, the separable 8-bit
//! resampler built on them, and error metrics between planes.

pub mod contribution;
pub mod filters;
pub mod metrics;
mod resampler;

pub use contribution::{Contribution, reflect_index};
pub use filters::{Filter, FilterKind};
pub use metrics::{MAX_MSE, mse, psnr};
pub use resampler::resample;
