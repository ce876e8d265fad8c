use std::io::Write;

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, colortype};
use tracing::debug;

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::config::{CodecConfig, TiffCompression};
use crate::pyramid_codec::raster::types::Raster;
use crate::pyramid_codec::raster::writer::RasterWriter;

/// Encodes 8-bit planes as Gray8 TIFF using `config.output_compression`.
pub struct TiffRasterWriter;

impl RasterWriter for TiffRasterWriter {
    fn write_raster(
        &self,
        raster: &Raster,
        output: &mut dyn Write,
        config: &CodecConfig,
    ) -> Result<()> {
        debug!("Encoding TIFF image: {}x{}", raster.width(), raster.height());

        let pixels = raster.expect_gray8()?;
        let dims = raster.dimensions()?;

        let compression = match config.output_compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| CodecError::EncodeError(e.to_string()))?
            .with_compression(compression);

        encoder
            .write_image::<colortype::Gray8>(dims.width, dims.height, pixels)
            .map_err(|e| CodecError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}
