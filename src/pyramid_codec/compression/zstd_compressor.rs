use std::ffi::{CStr, c_void};

use tracing::trace;
use zstd_sys::{
    ZSTD_compress, ZSTD_compressBound, ZSTD_decompress, ZSTD_getErrorName, ZSTD_isError,
};

use super::compressor::ByteCompressor;
use crate::pyramid_codec::common::error::{CodecError, Result};

pub const MIN_ZSTD_LEVEL: i32 = 1;
pub const MAX_ZSTD_LEVEL: i32 = 22;

/// Single-shot zstd compression at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    /// Creates a compressor for `level` (1 fastest, 22 smallest).
    pub fn new(level: i32) -> Result<Self> {
        if !(MIN_ZSTD_LEVEL..=MAX_ZSTD_LEVEL).contains(&level) {
            return Err(CodecError::InvalidCompressionLevel(level));
        }
        Ok(Self { level })
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl ByteCompressor for ZstdCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        // SAFETY: pure size computation, no pointers involved.
        let bound = unsafe { ZSTD_compressBound(data.len()) };
        let mut output = vec![0u8; bound];

        // SAFETY: `output` is writable for `output.len()` bytes and `data` readable for
        // `data.len()` bytes; both outlive the call.
        let written = unsafe {
            ZSTD_compress(
                output.as_mut_ptr() as *mut c_void,
                output.len(),
                data.as_ptr() as *const c_void,
                data.len(),
                self.level,
            )
        };
        if is_error(written) {
            return Err(CodecError::CompressionFailed(error_name(written)));
        }

        output.truncate(written);
        trace!(
            input = data.len(),
            output = written,
            level = self.level,
            "zstd compressed"
        );
        Ok(output)
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut output = vec![0u8; expected_len];

        // SAFETY: `output` is writable for `expected_len` bytes and `data` readable for
        // `data.len()` bytes; zstd never writes past the given capacity.
        let written = unsafe {
            ZSTD_decompress(
                output.as_mut_ptr() as *mut c_void,
                output.len(),
                data.as_ptr() as *const c_void,
                data.len(),
            )
        };
        if is_error(written) {
            return Err(CodecError::DecompressionFailed(error_name(written)));
        }
        if written != expected_len {
            return Err(CodecError::DecompressionFailed(format!(
                "expected {expected_len} bytes, got {written}"
            )));
        }

        Ok(output)
    }
}

fn is_error(code: usize) -> bool {
    // SAFETY: inspects a plain return code.
    unsafe { ZSTD_isError(code) != 0 }
}

fn error_name(code: usize) -> String {
    // SAFETY: returns a pointer to a static string owned by zstd, or null.
    let name = unsafe { ZSTD_getErrorName(code) };
    if name.is_null() {
        return format!("zstd error code {code}");
    }
    // SAFETY: `name` is non-null and NUL-terminated with static lifetime.
    unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
}
