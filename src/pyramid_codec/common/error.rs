use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported bit depth: {0} (only 8-bit planes are supported)")]
    UnsupportedBitDepth(u8),

    #[error("Dimension mismatch: {0}x{1} vs {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("Invalid filter index: {0}")]
    InvalidFilter(usize),

    #[error("Invalid compression level: {0}")]
    InvalidCompressionLevel(i32),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("Malformed residual payload: {0}")]
    MalformedPayload(String),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
