//! Raster plane types

use crate::pyramid_codec::common::error::{CodecError, Result};

/// Width and height of a plane, as stored in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reduces both sides by the pyramid factor of 3, rounding half up.
    pub fn downsample(self) -> Self {
        Self {
            width: downsample(self.width),
            height: downsample(self.height),
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// `floor(dim / 3 + 0.5)` in integer arithmetic.
pub fn downsample(dim: u32) -> u32 {
    dim / 3 + u32::from(dim % 3 == 2)
}

/// Sample storage of a single-channel plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Samples {
    Gray8(Vec<u8>),
    Gray16(Vec<u16>),
}

/// Single-channel raster plane, row-major with no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    samples: Samples,
}

impl Raster {
    /// Allocates a zeroed 8-bit plane.
    pub fn new_gray8(dims: Dimensions) -> Self {
        Self {
            width: dims.width as usize,
            height: dims.height as usize,
            samples: Samples::Gray8(vec![0; dims.pixel_count()]),
        }
    }

    pub fn filled_gray8(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            samples: Samples::Gray8(vec![value; width * height]),
        }
    }

    pub fn from_gray8(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            samples: Samples::Gray8(data),
        })
    }

    pub fn from_gray16(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            samples: Samples::Gray16(data),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bit_depth(&self) -> u8 {
        match self.samples {
            Samples::Gray8(_) => 8,
            Samples::Gray16(_) => 16,
        }
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Container dimensions of this plane. Fails when a side does not fit in `u32`.
    pub fn dimensions(&self) -> Result<Dimensions> {
        match (u32::try_from(self.width), u32::try_from(self.height)) {
            (Ok(width), Ok(height)) => Ok(Dimensions { width, height }),
            _ => Err(CodecError::InvalidDimensions(self.width, self.height)),
        }
    }

    pub fn gray8(&self) -> Option<&[u8]> {
        match &self.samples {
            Samples::Gray8(data) => Some(data),
            Samples::Gray16(_) => None,
        }
    }

    pub fn gray8_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.samples {
            Samples::Gray8(data) => Some(data),
            Samples::Gray16(_) => None,
        }
    }

    /// Like [`Raster::gray8`], reporting non-8-bit planes as an error.
    pub fn expect_gray8(&self) -> Result<&[u8]> {
        let depth = self.bit_depth();
        self.gray8().ok_or(CodecError::UnsupportedBitDepth(depth))
    }

    pub fn expect_gray8_mut(&mut self) -> Result<&mut [u8]> {
        let depth = self.bit_depth();
        self.gray8_mut().ok_or(CodecError::UnsupportedBitDepth(depth))
    }

    /// Returns `None` outside the plane or for 16-bit planes.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.gray8().map(|data| data[y * self.width + x])
    }

    /// Writes one 8-bit sample. Returns `false` if nothing was written.
    pub fn put_pixel(&mut self, x: usize, y: usize, value: u8) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let width = self.width;
        match self.gray8_mut() {
            Some(data) => {
                data[y * width + x] = value;
                true
            }
            None => false,
        }
    }
}

fn check_len(width: usize, height: usize, len: usize) -> Result<()> {
    match width.checked_mul(height) {
        Some(expected) if expected == len => Ok(()),
        _ => Err(CodecError::InvalidDimensions(width, height)),
    }
}
