//! PYR container: a pyramid framed for storage.
//!
//! ```text
//! magic             3 bytes  "PYR"
//! original width    u32
//! original height   u32
//! levels            u8
//! compressed size   u32
//! uncompressed size u32
//! top width         u32
//! top height        u32
//! top pixels        top width * top height bytes, row-major
//! payload           compressed size bytes
//! ```
//!
//! Integers are little-endian.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::raster::{Dimensions, Raster};
use crate::pyramid_codec::residual::bit_vector::byte_len;
use crate::pyramid_codec::residual::pyramid::{Pyramid, residual_len, top_dimensions};

pub const CONTAINER_MAGIC: &[u8; 3] = b"PYR";

/// Size of everything before the top plane pixels.
pub const HEADER_LEN: usize = 3 + 4 + 4 + 1 + 4 + 4 + 4 + 4;

pub fn write_container(pyramid: &Pyramid, output: &mut dyn Write) -> Result<()> {
    let original = pyramid.original_dimensions();
    let top = pyramid.top();
    let top_dims = top.dimensions()?;
    let compressed_len = u32::try_from(pyramid.compressed_len())
        .map_err(|_| CodecError::PayloadTooLarge(pyramid.compressed_len()))?;

    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(CONTAINER_MAGIC);
    header.extend_from_slice(&original.width.to_le_bytes());
    header.extend_from_slice(&original.height.to_le_bytes());
    header.push(pyramid.num_levels());
    header.extend_from_slice(&compressed_len.to_le_bytes());
    header.extend_from_slice(&pyramid.uncompressed_len().to_le_bytes());
    header.extend_from_slice(&top_dims.width.to_le_bytes());
    header.extend_from_slice(&top_dims.height.to_le_bytes());

    output.write_all(&header)?;
    output.write_all(top.expect_gray8()?)?;
    output.write_all(pyramid.compressed())?;
    Ok(())
}

pub fn container_bytes(pyramid: &Pyramid) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(
        HEADER_LEN + pyramid.top().width() * pyramid.top().height() + pyramid.compressed_len(),
    );
    write_container(pyramid, &mut bytes)?;
    Ok(bytes)
}

pub fn read_container(bytes: &[u8]) -> Result<Pyramid> {
    let mut reader = FieldReader::new(bytes);

    let magic = reader.take(3, "magic")?;
    if magic != CONTAINER_MAGIC {
        return Err(malformed(format!("bad magic {magic:02x?}")));
    }

    let original = Dimensions::new(reader.u32("original width")?, reader.u32("original height")?);
    let num_levels = reader.u8("level count")?;
    let compressed_len = reader.u32("compressed size")? as usize;
    let uncompressed_len = reader.u32("uncompressed size")?;
    let top_dims = Dimensions::new(reader.u32("top width")?, reader.u32("top height")?);

    debug!(
        ?original,
        num_levels, compressed_len, uncompressed_len, ?top_dims, "Container header"
    );

    if top_dims != top_dimensions(original, num_levels) {
        return Err(malformed(format!(
            "top plane {}x{} does not follow from {}x{} after {} levels",
            top_dims.width, top_dims.height, original.width, original.height, num_levels
        )));
    }

    let residuals = residual_len(original, num_levels)
        .ok_or_else(|| malformed("level sizes overflow".to_string()))?;
    let (min_payload, max_payload) = payload_bounds(residuals)
        .ok_or_else(|| malformed("payload bounds overflow".to_string()))?;
    if (uncompressed_len as usize) < min_payload || uncompressed_len as usize > max_payload {
        return Err(malformed(format!(
            "uncompressed size {uncompressed_len} outside {min_payload}..={max_payload}"
        )));
    }

    let top_len = top_dims.pixel_count();
    let expected_rest = top_len
        .checked_add(compressed_len)
        .ok_or_else(|| malformed("body size overflows".to_string()))?;
    if reader.remaining() != expected_rest {
        return Err(malformed(format!(
            "body holds {} bytes, header declares {expected_rest}",
            reader.remaining()
        )));
    }

    let top_pixels = reader.take(top_len, "top plane")?.to_vec();
    let compressed = reader.take(compressed_len, "payload")?.to_vec();
    let top = Raster::from_gray8(
        top_dims.width as usize,
        top_dims.height as usize,
        top_pixels,
    )?;

    Pyramid::from_parts(compressed, uncompressed_len, num_levels, original, top)
}

pub fn write_container_file<P: AsRef<Path>>(pyramid: &Pyramid, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = container_bytes(pyramid)?;
    std::fs::write(path, bytes)
        .map_err(|e| CodecError::OutputWriteError(format!("{}: {}", path.display(), e)))
}

pub fn read_container_file<P: AsRef<Path>>(path: P) -> Result<Pyramid> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CodecError::InputReadError(format!("{}: {}", path.display(), e)))?;
    read_container(&bytes)
}

/// Smallest and largest payload for `residuals` residual bytes: no escapes,
/// or every residual escaped.
fn payload_bounds(residuals: usize) -> Option<(usize, usize)> {
    let min = residuals.checked_add(4)?;
    let max = residuals
        .checked_mul(5)?
        .checked_add(byte_len(residuals))?
        .checked_add(4)?;
    Some((min, max))
}

fn malformed(message: String) -> CodecError {
    CodecError::MalformedContainer(message)
}

struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(malformed(format!(
                "truncated at {field}: need {len} bytes, {} left",
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
