//! Residual pyramid build and reconstruction.
//!
//! Each level downsamples the current plane by 3, upsamples it back and keeps
//! the per-pixel difference to that prediction. Building stops once another
//! downsample would leave a side of 2 pixels or fewer; that last plane is
//! stored uncompressed as the top of the pyramid.

use tracing::{debug, instrument};

use crate::pyramid_codec::common::error::{CodecError, Result};
use crate::pyramid_codec::compression::{ByteCompressor, ZstdCompressor};
use crate::pyramid_codec::raster::{Dimensions, Raster};
use crate::pyramid_codec::resample::{FilterKind, resample};
use crate::pyramid_codec::residual::payload::{ResidualEncoder, ResidualPayload};

/// Kernel used for every downsample and upsample step.
pub const LEVEL_FILTER: FilterKind = FilterKind::Lanczos3;

/// A level is only built while both downsampled sides stay above this.
pub const MIN_LEVEL_DIMENSION: u32 = 2;

/// Compressed pyramid state. Owns its payload and its top plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pyramid {
    compressed: Vec<u8>,
    uncompressed_len: u32,
    num_levels: u8,
    original: Dimensions,
    top: Raster,
}

impl Pyramid {
    /// Assembles a pyramid from its stored parts, checking that the top plane
    /// is 8-bit and has the dimensions implied by `original` and `num_levels`.
    pub fn from_parts(
        compressed: Vec<u8>,
        uncompressed_len: u32,
        num_levels: u8,
        original: Dimensions,
        top: Raster,
    ) -> Result<Self> {
        top.expect_gray8()?;
        let expected_top = top_dimensions(original, num_levels);
        if top.dimensions()? != expected_top {
            return Err(CodecError::InvalidDimensions(top.width(), top.height()));
        }

        Ok(Self {
            compressed,
            uncompressed_len,
            num_levels,
            original,
            top,
        })
    }

    pub fn compressed(&self) -> &[u8] {
        &self.compressed
    }

    pub fn compressed_len(&self) -> usize {
        self.compressed.len()
    }

    pub fn uncompressed_len(&self) -> u32 {
        self.uncompressed_len
    }

    pub fn num_levels(&self) -> u8 {
        self.num_levels
    }

    pub fn original_dimensions(&self) -> Dimensions {
        self.original
    }

    pub fn top(&self) -> &Raster {
        &self.top
    }

    /// Dimensions of every residual level, finest first.
    pub fn level_dimensions(&self) -> Vec<Dimensions> {
        level_dimensions(self.original, self.num_levels)
    }
}

/// Dimensions of `num_levels` residual levels starting at `original`, finest first.
pub fn level_dimensions(original: Dimensions, num_levels: u8) -> Vec<Dimensions> {
    std::iter::successors(Some(original), |dims| Some(dims.downsample()))
        .take(usize::from(num_levels))
        .collect()
}

/// Dimensions of the top plane after `num_levels` downsamples.
pub fn top_dimensions(original: Dimensions, num_levels: u8) -> Dimensions {
    (0..num_levels).fold(original, |dims, _| dims.downsample())
}

/// Total residual bytes for `num_levels` levels starting at `original`.
pub fn residual_len(original: Dimensions, num_levels: u8) -> Option<usize> {
    level_dimensions(original, num_levels)
        .into_iter()
        .try_fold(0usize, |total, dims| total.checked_add(dims.pixel_count()))
}

fn can_reduce(dims: Dimensions) -> bool {
    let next = dims.downsample();
    next.width > MIN_LEVEL_DIMENSION && next.height > MIN_LEVEL_DIMENSION
}

/// Summary of one build, for logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub num_levels: u8,
    pub escapes: usize,
    pub residual_bytes: usize,
    pub payload_bytes: usize,
    pub compressed_bytes: usize,
}

/// Builds and reconstructs pyramids, compressing payloads with `C`.
pub struct PyramidCodec<C: ByteCompressor = ZstdCompressor> {
    compressor: C,
}

impl PyramidCodec<ZstdCompressor> {
    pub fn new(compression_level: i32) -> Result<Self> {
        Ok(Self {
            compressor: ZstdCompressor::new(compression_level)?,
        })
    }
}

impl<C: ByteCompressor> PyramidCodec<C> {
    pub fn with_compressor(compressor: C) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    pub fn build(&self, source: &Raster) -> Result<Pyramid> {
        self.build_with_stats(source).map(|(pyramid, _)| pyramid)
    }

    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn build_with_stats(&self, source: &Raster) -> Result<(Pyramid, BuildStats)> {
        source.expect_gray8()?;
        let original = source.dimensions()?;
        if original.width == 0 || original.height == 0 {
            return Err(CodecError::InvalidDimensions(source.width(), source.height()));
        }

        let mut encoder = ResidualEncoder::new();
        let mut num_levels: u8 = 0;
        let mut current = source.clone();
        let mut dims = original;

        while can_reduce(dims) {
            let reduced_dims = dims.downsample();
            let mut reduced = Raster::new_gray8(reduced_dims);
            resample(&current, &mut reduced, LEVEL_FILTER)?;

            let mut preview = Raster::new_gray8(dims);
            resample(&reduced, &mut preview, LEVEL_FILTER)?;

            let escapes_before = encoder.escape_count();
            for (&actual, &predicted) in current.expect_gray8()?.iter().zip(preview.expect_gray8()?) {
                encoder.push(i16::from(actual) - i16::from(predicted))?;
            }

            num_levels = num_levels
                .checked_add(1)
                .ok_or(CodecError::InvalidDimensions(source.width(), source.height()))?;
            debug!(
                level = num_levels,
                width = dims.width,
                height = dims.height,
                escapes = encoder.escape_count() - escapes_before,
                "Residual level captured"
            );

            current = reduced;
            dims = reduced_dims;
        }

        let escapes = encoder.escape_count();
        let residual_bytes = encoder.len();
        let payload = encoder.into_payload()?;
        let uncompressed_len =
            u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge(payload.len()))?;
        let compressed = self.compressor.compress(&payload)?;

        let stats = BuildStats {
            num_levels,
            escapes,
            residual_bytes,
            payload_bytes: payload.len(),
            compressed_bytes: compressed.len(),
        };
        debug!(?stats, top_width = dims.width, top_height = dims.height, "Pyramid built");

        let pyramid = Pyramid::from_parts(compressed, uncompressed_len, num_levels, original, current)?;
        Ok((pyramid, stats))
    }

    /// Rebuilds a plane of the pyramid's original dimensions. The pyramid is not modified.
    #[instrument(skip_all, fields(levels = pyramid.num_levels()))]
    pub fn reconstruct(&self, pyramid: &Pyramid) -> Result<Raster> {
        let expected_len = pyramid.uncompressed_len() as usize;
        let payload = self.compressor.decompress(pyramid.compressed(), expected_len)?;
        if payload.len() != expected_len {
            return Err(CodecError::DecompressionFailed(format!(
                "expected {expected_len} bytes, got {}",
                payload.len()
            )));
        }

        let payload = ResidualPayload::parse(&payload)?;
        let levels = pyramid.level_dimensions();
        let expected_residuals: usize = levels.iter().map(|dims| dims.pixel_count()).sum();
        if payload.stream_len() != expected_residuals {
            return Err(CodecError::MalformedPayload(format!(
                "residual stream holds {} bytes, levels need {expected_residuals}",
                payload.stream_len()
            )));
        }
        let residuals = payload.decode();

        let mut current = pyramid.top().clone();
        let mut end = residuals.len();
        for dims in levels.iter().rev() {
            let start = end - dims.pixel_count();
            let mut upsampled = Raster::new_gray8(*dims);
            resample(&current, &mut upsampled, LEVEL_FILTER)?;

            for (pixel, &residual) in upsampled
                .expect_gray8_mut()?
                .iter_mut()
                .zip(&residuals[start..end])
            {
                *pixel = (i16::from(*pixel) + residual).clamp(0, 255) as u8;
            }

            debug!(width = dims.width, height = dims.height, "Level reconstructed");
            current = upsampled;
            end = start;
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid_codec::resample::mse;
    use std::cell::RefCell;

    /// Stores payloads verbatim so tests can inspect them.
    #[derive(Default)]
    struct StoreCompressor {
        last_payload: RefCell<Vec<u8>>,
    }

    impl ByteCompressor for StoreCompressor {
        fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
            *self.last_payload.borrow_mut() = data.to_vec();
            Ok(data.to_vec())
        }

        fn decompress(&self, data: &[u8], _expected_len: usize) -> Result<Vec<u8>> {
            Ok(data.to_vec())
        }
    }

    struct FailingCompressor;

    impl ByteCompressor for FailingCompressor {
        fn compress(&self, _data: &[u8]) -> Result<Vec<u8>> {
            Err(CodecError::CompressionFailed("mock failure".to_string()))
        }

        fn decompress(&self, _data: &[u8], _expected_len: usize) -> Result<Vec<u8>> {
            Err(CodecError::DecompressionFailed("mock failure".to_string()))
        }
    }

    fn smooth(width: usize, height: usize) -> Raster {
        let pixels = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    let fx = x as f64 / width as f64;
                    let fy = y as f64 / height as f64;
                    let v = 128.0
                        + 60.0 * (fx * std::f64::consts::TAU).sin()
                        + 40.0 * (fy * std::f64::consts::PI * 1.5).cos();
                    v.round().clamp(0.0, 255.0) as u8
                })
            })
            .collect();
        Raster::from_gray8(width, height, pixels).unwrap()
    }

    fn nearest_round_trip(source: &Raster) -> Raster {
        let (w, h) = (source.width(), source.height());
        let dims = source.dimensions().unwrap().downsample();
        let (sw, sh) = (dims.width as usize, dims.height as usize);
        let src = source.gray8().unwrap();
        let small: Vec<u8> = (0..sh)
            .flat_map(|y| (0..sw).map(move |x| (x, y)))
            .map(|(x, y)| src[(y * 3).min(h - 1) * w + (x * 3).min(w - 1)])
            .collect();
        let pixels = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| small[(y / 3).min(sh - 1) * sw + (x / 3).min(sw - 1)])
            .collect();
        Raster::from_gray8(w, h, pixels).unwrap()
    }

    #[test]
    fn constant_nine_by_nine_round_trips_with_one_level() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        let source = Raster::filled_gray8(9, 9, 100);

        let (pyramid, stats) = codec.build_with_stats(&source).unwrap();
        assert_eq!(pyramid.num_levels(), 1);
        assert_eq!(stats.escapes, 0);
        assert_eq!(pyramid.top().dimensions().unwrap(), Dimensions::new(3, 3));
        assert!(pyramid.top().gray8().unwrap().iter().all(|&p| p == 100));

        let payload = codec.compressor().last_payload.borrow().clone();
        assert_eq!(&payload[..4], &[0, 0, 0, 0]);
        assert_eq!(payload.len(), 4 + 81);
        assert!(payload[4..].iter().all(|&b| b == 128));

        let restored = codec.reconstruct(&pyramid).unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn smooth_image_reconstructs_better_than_nearest_neighbour() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        let source = smooth(97, 64);

        let pyramid = codec.build(&source).unwrap();
        // 97x64 -> 32x21 -> 11x7; 4x2 would be too small.
        assert_eq!(pyramid.num_levels(), 2);
        assert_eq!(pyramid.original_dimensions(), Dimensions::new(97, 64));
        assert_eq!(pyramid.top().dimensions().unwrap(), Dimensions::new(11, 7));

        let restored = codec.reconstruct(&pyramid).unwrap();
        assert_eq!(restored.width(), 97);
        assert_eq!(restored.height(), 64);

        let error = mse(&source, &restored).unwrap();
        let baseline = mse(&source, &nearest_round_trip(&source)).unwrap();
        assert!(baseline > 1.0, "baseline {baseline}");
        assert!(error < baseline, "pyramid {error} vs nearest {baseline}");
        assert!(error < 1.0, "pyramid mse {error}");
    }

    #[test]
    fn noisy_image_produces_escapes_and_still_round_trips() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        // Isolated spikes cannot be predicted from the coarse level.
        let pixels = (0..27 * 27)
            .map(|i| if i % 13 == 0 { 255 } else { 0 })
            .collect();
        let source = Raster::from_gray8(27, 27, pixels).unwrap();

        let (pyramid, stats) = codec.build_with_stats(&source).unwrap();
        assert!(stats.escapes > 0);
        let restored = codec.reconstruct(&pyramid).unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn tiny_images_become_the_top_plane() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        let pixels = (0..40).map(|v| v as u8).collect();
        // Downsample(5) = 2, so no level can be built.
        let source = Raster::from_gray8(8, 5, pixels).unwrap();

        let pyramid = codec.build(&source).unwrap();
        assert_eq!(pyramid.num_levels(), 0);
        assert_eq!(pyramid.uncompressed_len(), 4);
        assert_eq!(pyramid.top(), &source);
        assert_eq!(codec.reconstruct(&pyramid).unwrap(), source);
    }

    #[test]
    fn level_dimensions_follow_downsampling() {
        let original = Dimensions::new(100, 40);
        assert_eq!(
            level_dimensions(original, 2),
            vec![Dimensions::new(100, 40), Dimensions::new(33, 13)]
        );
        assert_eq!(top_dimensions(original, 2), Dimensions::new(11, 4));
        assert_eq!(residual_len(original, 2), Some(4000 + 429));
        assert!(level_dimensions(original, 0).is_empty());
    }

    #[test]
    fn build_terminates_for_every_small_size() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        for w in 1..30 {
            for h in [1, 3, 8, 9, 26] {
                let source = Raster::filled_gray8(w, h, 7);
                let pyramid = codec.build(&source).unwrap();
                let top = pyramid.top().dimensions().unwrap();
                assert!(!can_reduce(top), "{w}x{h}");
            }
        }
    }

    #[test]
    fn compressor_failures_are_hard_errors() {
        let codec = PyramidCodec::with_compressor(FailingCompressor);
        let source = Raster::filled_gray8(12, 12, 1);
        assert!(matches!(
            codec.build(&source),
            Err(CodecError::CompressionFailed(_))
        ));

        let good = PyramidCodec::with_compressor(StoreCompressor::default());
        let pyramid = good.build(&source).unwrap();
        assert!(matches!(
            codec.reconstruct(&pyramid),
            Err(CodecError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn payload_not_matching_levels_is_rejected() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        let source = Raster::filled_gray8(9, 9, 50);
        let pyramid = codec.build(&source).unwrap();

        let mut short = pyramid.compressed().to_vec();
        short.pop();
        let broken = Pyramid::from_parts(
            short,
            pyramid.uncompressed_len() - 1,
            pyramid.num_levels(),
            pyramid.original_dimensions(),
            pyramid.top().clone(),
        )
        .unwrap();
        assert!(matches!(
            codec.reconstruct(&broken),
            Err(CodecError::MalformedPayload(_))
        ));
    }

    #[test]
    fn repeated_escape_offsets_fail_instead_of_overflowing() {
        // 30x30 -> 10x10 -> 3x3 top: 1000 residual bytes over two levels.
        let mut payload = 300u32.to_le_bytes().to_vec();
        payload.extend(std::iter::repeat_n(0u8, 300 * 4));
        payload.extend(std::iter::repeat_n(0u8, 300usize.div_ceil(8)));
        payload.extend(std::iter::repeat_n(128u8, 1000));

        let pyramid = Pyramid::from_parts(
            payload.clone(),
            payload.len() as u32,
            2,
            Dimensions::new(30, 30),
            Raster::filled_gray8(3, 3, 10),
        )
        .unwrap();

        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        assert!(matches!(
            codec.reconstruct(&pyramid),
            Err(CodecError::MalformedPayload(_))
        ));
    }

    #[test]
    fn from_parts_checks_top_dimensions() {
        let result = Pyramid::from_parts(
            vec![],
            4,
            1,
            Dimensions::new(9, 9),
            Raster::filled_gray8(4, 3, 0),
        );
        assert!(matches!(result, Err(CodecError::InvalidDimensions(4, 3))));
    }

    #[test]
    fn rejects_non_gray8_sources() {
        let codec = PyramidCodec::with_compressor(StoreCompressor::default());
        let source = Raster::from_gray16(9, 9, vec![0; 81]).unwrap();
        assert!(matches!(
            codec.build(&source),
            Err(CodecError::UnsupportedBitDepth(16))
        ));
    }
}
