//! Residual pyramid image codec
//!
//! This module provides lossless compression of 8-bit grayscale planes as a
//! pyramid of Lanczos-predicted residuals, with separate modules for resampling,
//! residual coding, payload compression and file orchestration.

pub mod common;
pub mod compression;
pub mod config;
pub mod conversions;
pub mod raster;
pub mod resample;
pub mod residual;

pub use common::{CodecError, Result};

pub use compression::{ByteCompressor, ZstdCompressor};

pub use config::{CodecConfig, CodecConfigBuilder, DEFAULT_COMPRESSION_LEVEL, TiffCompression};

pub use raster::{
    Dimensions, Raster, RasterReader, RasterWriter, TiffRasterReader, TiffRasterWriter,
};

pub use resample::{FilterKind, mse, psnr, resample};

pub use residual::{
    BitVector, BuildStats, Pyramid, PyramidCodec, read_container, read_container_file,
    write_container, write_container_file,
};

pub use conversions::{BatchSummary, PipelineTimings, PyramidPipeline, RoundTripReport};
