//! Raster plane module
//!
//! This module provides the single-channel plane type consumed by the codec,
//! together with TIFF reading and writing.

mod reader;
mod tiff_reader;
mod tiff_writer;
pub mod types;
mod writer;

pub use reader::RasterReader;
pub use tiff_reader::TiffRasterReader;
pub use tiff_writer::TiffRasterWriter;
pub use types::{Dimensions, Raster, Samples, downsample};
pub use writer::RasterWriter;
