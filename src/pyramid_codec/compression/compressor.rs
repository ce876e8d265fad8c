use crate::pyramid_codec::common::error::Result;

/// Trait for lossless byte compressors
pub trait ByteCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// `expected_len` is the exact size of the original data.
    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>>;
}
