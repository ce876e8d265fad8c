use crate::pyramid_codec::common::error::Result;
use crate::pyramid_codec::raster::types::Raster;

pub trait RasterReader {
    fn read_raster(&self, data: &[u8]) -> Result<Raster>;
}
