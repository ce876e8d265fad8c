//! Error metrics between two 8-bit planes.

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::raster::Raster;

/// Largest possible mean squared error between 8-bit planes.
pub const MAX_MSE: f64 = 255.0 * 255.0;

/// PSNR reported for identical planes.
///
/// Two 64K x 64K planes differing by a single pixel value reach about 144.5 dB.
pub const IDENTICAL_PSNR: f64 = 150.0;

/// Mean squared error between two equally sized 8-bit planes.
pub fn mse(a: &Raster, b: &Raster) -> Result<f64> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(CodecError::DimensionMismatch(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }

    let lhs = a.expect_gray8()?;
    let rhs = b.expect_gray8()?;
    if lhs.is_empty() {
        return Ok(0.0);
    }

    let square_sum: u64 = lhs
        .iter()
        .zip(rhs)
        .map(|(&x, &y)| {
            let delta = i64::from(x) - i64::from(y);
            (delta * delta) as u64
        })
        .sum();

    Ok(square_sum as f64 / lhs.len() as f64)
}

/// Peak signal-to-noise ratio in dB for a given mean squared error.
pub fn psnr(mse: f64) -> f64 {
    if mse == 0.0 {
        return IDENTICAL_PSNR;
    }
    10.0 * (MAX_MSE / mse).log10()
}
