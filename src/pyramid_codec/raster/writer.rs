use std::io::Write;
use crate::pyramid_codec::common::error::Result;
use crate::pyramid_codec::config::CodecConfig;
use crate::pyramid_codec::raster::types::Raster;

pub trait RasterWriter {
    fn write_raster(&self, raster: &Raster, output: &mut dyn Write, config: &CodecConfig) -> Result<()>;
}
