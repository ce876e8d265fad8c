//! Payload compression module
//!
//! This module provides the byte compressor abstraction used for residual
//! payloads and its zstd implementation.

mod compressor;
mod zstd_compressor;

pub use compressor::ByteCompressor;
pub use zstd_compressor::{MAX_ZSTD_LEVEL, MIN_ZSTD_LEVEL, ZstdCompressor};
