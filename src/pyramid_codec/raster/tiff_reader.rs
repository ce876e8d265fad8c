//! Grayscale TIFF reader built on the `tiff` crate.

use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::raster::reader::RasterReader;
use crate::pyramid_codec::raster::types::Raster;

/// Decodes single-channel 8-bit and 16-bit TIFF images.
///
/// Any other colour type is reported as [`CodecError::DecodeError`]. 16-bit
/// planes decode successfully so callers can decide whether to skip them.
pub struct TiffRasterReader;

impl RasterReader for TiffRasterReader {
    fn read_raster(&self, data: &[u8]) -> Result<Raster> {
        debug!("Decoding TIFF image, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| CodecError::DecodeError(e.to_string()))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| CodecError::DecodeError(e.to_string()))?;
        let color_type = decoder
            .colortype()
            .map_err(|e| CodecError::DecodeError(e.to_string()))?;

        debug!("Decoded header: {}x{} {:?}", width, height, color_type);

        if !matches!(color_type, ColorType::Gray(8) | ColorType::Gray(16)) {
            return Err(CodecError::DecodeError(format!(
                "unsupported color type {color_type:?}"
            )));
        }

        let (width, height) = (width as usize, height as usize);
        match decoder
            .read_image()
            .map_err(|e| CodecError::DecodeError(e.to_string()))?
        {
            DecodingResult::U8(pixels) => Raster::from_gray8(width, height, pixels),
            DecodingResult::U16(pixels) => Raster::from_gray16(width, height, pixels),
            _ => Err(CodecError::DecodeError(
                "unexpected sample format".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid_codec::config::{CodecConfig, TiffCompression};
    use crate::pyramid_codec::raster::{RasterWriter, TiffRasterWriter};

    #[test]
    fn reads_back_written_gray8() {
        let pixels: Vec<u8> = (0..35).map(|v| (v * 7) as u8).collect();
        let raster = Raster::from_gray8(7, 5, pixels).unwrap();

        let mut encoded = Vec::new();
        let config = CodecConfig::builder()
            .output_compression(TiffCompression::Lzw)
            .build();
        TiffRasterWriter
            .write_raster(&raster, &mut encoded, &config)
            .unwrap();

        let decoded = TiffRasterReader.read_raster(&encoded).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = TiffRasterReader.read_raster(b"definitely not a tiff");
        assert!(matches!(result, Err(CodecError::DecodeError(_))));
    }
}
