//! Codec and pipeline configuration types

/// Default zstd level for the residual payload.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 19;

/// TIFF compression methods for reconstructed images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Configuration for pyramid encoding and the file pipeline
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// zstd level applied to the residual payload (1-22)
    pub compression_level: i32,
    /// Whether to validate image dimensions before encoding
    pub validate_dimensions: bool,
    /// Largest accepted width or height when validating
    pub max_dimension: Option<usize>,
    /// Compression of the reconstructed TIFF written by the pipeline
    pub output_compression: TiffCompression,
    /// Input file extensions processed in directory mode, matched case-insensitively
    pub extensions: Vec<String>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            validate_dimensions: true,
            max_dimension: Some(65_535),
            output_compression: TiffCompression::None,
            extensions: vec!["tif".to_string(), "tiff".to_string()],
        }
    }
}

impl CodecConfig {
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }

    pub fn matches_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    }
}

/// Builder for CodecConfig
#[derive(Default)]
pub struct CodecConfigBuilder {
    compression_level: Option<i32>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
    output_compression: Option<TiffCompression>,
    extensions: Option<Vec<String>>,
}

impl CodecConfigBuilder {
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn output_compression(mut self, compression: TiffCompression) -> Self {
        self.output_compression = Some(compression);
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> CodecConfig {
        let default = CodecConfig::default();
        CodecConfig {
            compression_level: self.compression_level.unwrap_or(default.compression_level),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
            output_compression: self.output_compression.unwrap_or(default.output_compression),
            extensions: self.extensions.unwrap_or(default.extensions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_given_fields() {
        let config = CodecConfig::builder()
            .compression_level(3)
            .max_dimension(None)
            .build();

        assert_eq!(config.compression_level, 3);
        assert_eq!(config.max_dimension, None);
        assert!(config.validate_dimensions);
        assert_eq!(config.output_compression, TiffCompression::None);
        assert_eq!(config.extensions, vec!["tif", "tiff"]);
    }

    #[test]
    fn extension_matching_ignores_case() {
        let config = CodecConfig::builder().extensions(["TIF"]).build();
        assert!(config.matches_extension("tif"));
        assert!(config.matches_extension("Tif"));
        assert!(!config.matches_extension("png"));
    }
}
