//! Separable 8-bit resampler.
//!
//! Horizontal contributions are computed on the fly for each destination
//! column, so no full-width intermediate image is allocated; only one column
//! of `source.height()` values is kept. Vertical contributions are computed
//! once per call and reused by every column.
//!
//! If all source samples feeding an output value are equal, that value is
//! emitted as is, so filters never disturb areas of constant colour. Weighted
//! sums are clamped and rounded to nearest, never truncated.

use tracing::trace;

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::raster::Raster;
use crate::pyramid_codec::resample::contribution::{
    Contribution, axis_contributions, compute_contributions,
};
use crate::pyramid_codec::resample::filters::FilterKind;

/// Overwrites every pixel of `destination` with `source` resampled to the
/// destination size.
///
/// Both planes must be 8-bit and non-empty; otherwise nothing is written.
pub fn resample(source: &Raster, destination: &mut Raster, kind: FilterKind) -> Result<()> {
    let src = source.expect_gray8()?;
    if destination.gray8().is_none() {
        return Err(CodecError::UnsupportedBitDepth(destination.bit_depth()));
    }

    let (src_w, src_h) = (source.width(), source.height());
    let (dst_w, dst_h) = (destination.width(), destination.height());
    if src_w == 0 || src_h == 0 {
        return Err(CodecError::InvalidDimensions(src_w, src_h));
    }
    if dst_w == 0 || dst_h == 0 {
        return Err(CodecError::InvalidDimensions(dst_w, dst_h));
    }

    trace!(
        "Resampling {}x{} -> {}x{} with {:?}",
        src_w, src_h, dst_w, dst_h, kind
    );

    let filter = kind.filter();
    let x_scale = dst_w as f64 / src_w as f64;
    let contributions_y = axis_contributions(src_h, dst_h, &filter);
    let mut column = vec![0.0f64; src_h];

    let dst = destination.expect_gray8_mut()?;
    for x in 0..dst_w {
        let contributions_x = compute_contributions(x, x_scale, &filter, src_w);

        for (y, value) in column.iter_mut().enumerate() {
            let row = &src[y * src_w..(y + 1) * src_w];
            *value = apply(&contributions_x, |p| f64::from(row[p]));
        }

        for (y, contributions) in contributions_y.iter().enumerate() {
            dst[y * dst_w + x] = quantize(apply(contributions, |p| column[p]));
        }
    }

    Ok(())
}

/// Weighted sum of the contributing samples, or the shared sample value when
/// every contributor is identical.
fn apply(contributions: &[Contribution], sample: impl Fn(usize) -> f64) -> f64 {
    let Some((first, rest)) = contributions.split_first() else {
        return 0.0;
    };

    let anchor = sample(first.pixel);
    let mut sum = anchor * first.weight;
    let mut varies = false;
    for c in rest {
        let value = sample(c.pixel);
        varies |= value != anchor;
        sum += value * c.weight;
    }

    if varies { sum } else { anchor }
}

fn quantize(value: f64) -> u8 {
    if value <= 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        (value + 0.5) as u8
    }
}
