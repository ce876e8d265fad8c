use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument, warn};

use crate::pyramid_codec::{
    common::error::{CodecError, Result},
    compression::{ByteCompressor, ZstdCompressor},
    config::CodecConfig,
    conversions::timing::PipelineTimings,
    raster::{Dimensions, Raster, RasterReader, RasterWriter, TiffRasterReader, TiffRasterWriter},
    resample::{mse, psnr},
    residual::{
        BuildStats, Pyramid, PyramidCodec, container_bytes, read_container, read_container_file,
        write_container,
    },
};

/// Extension given to container files in directory mode.
pub const CONTAINER_EXTENSION: &str = "pyr";

/// Outcome of one file compressed to disk and restored from it.
#[derive(Debug, Clone)]
pub struct RoundTripReport {
    pub input: PathBuf,
    pub dimensions: Dimensions,
    pub stats: BuildStats,
    pub input_bytes: usize,
    pub container_bytes: usize,
    pub mse: f64,
    pub psnr: f64,
    pub timings: PipelineTimings,
}

impl RoundTripReport {
    /// Raw 8-bit pixel bytes per container byte.
    pub fn compression_ratio(&self) -> f64 {
        if self.container_bytes == 0 {
            return 0.0;
        }
        self.dimensions.pixel_count() as f64 / self.container_bytes as f64
    }

    pub fn bits_per_pixel(&self) -> f64 {
        let pixels = self.dimensions.pixel_count();
        if pixels == 0 {
            return 0.0;
        }
        self.container_bytes as f64 * 8.0 / pixels as f64
    }
}

/// Counts of a directory run. Skipped files are images that are not 8-bit.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<RoundTripReport>,
}

pub struct PyramidPipeline<R: RasterReader, W: RasterWriter, C: ByteCompressor> {
    reader: R,
    writer: W,
    codec: PyramidCodec<C>,
    config: CodecConfig,
}

impl PyramidPipeline<TiffRasterReader, TiffRasterWriter, ZstdCompressor> {
    /// TIFF in, zstd residuals, TIFF out. Fails if the configured level is not 1-22.
    pub fn new(config: CodecConfig) -> Result<Self> {
        Ok(Self {
            reader: TiffRasterReader,
            writer: TiffRasterWriter,
            codec: PyramidCodec::new(config.compression_level)?,
            config,
        })
    }
}

impl<R: RasterReader, W: RasterWriter, C: ByteCompressor> PyramidPipeline<R, W, C> {
    pub fn with_custom(reader: R, writer: W, compressor: C, config: CodecConfig) -> Self {
        Self {
            reader,
            writer,
            codec: PyramidCodec::with_compressor(compressor),
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(CodecError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    fn decode_image(&self, input_data: &[u8]) -> Result<Raster> {
        let raster = {
            let _span = tracing::info_span!("decode_image").entered();
            self.reader.read_raster(input_data)?
        };

        {
            let _span = tracing::info_span!(
                "validate_dimensions",
                width = raster.width(),
                height = raster.height()
            )
            .entered();
            self.validate_dimensions(raster.width(), raster.height())?;
        }

        Ok(raster)
    }

    /// Decodes an image, builds its pyramid and writes the container to `output`.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn encode(&self, input_data: &[u8], output: &mut dyn Write) -> Result<Pyramid> {
        info!("Starting pyramid encode");

        let raster = self.decode_image(input_data)?;

        let (pyramid, stats) = {
            let _span = tracing::info_span!("build_pyramid").entered();
            self.codec.build_with_stats(&raster)?
        };

        {
            let _span = tracing::info_span!("write_container").entered();
            write_container(&pyramid, output)?;
        }

        info!(
            width = raster.width(),
            height = raster.height(),
            levels = stats.num_levels,
            escapes = stats.escapes,
            compressed = stats.compressed_bytes,
            "Encode complete"
        );
        Ok(pyramid)
    }

    /// Parses a container, reconstructs the plane and writes it as an image to `output`.
    #[instrument(skip(self, container, output), fields(container_size = container.len()))]
    pub fn decode(&self, container: &[u8], output: &mut dyn Write) -> Result<Raster> {
        info!("Starting pyramid decode");

        let pyramid = {
            let _span = tracing::info_span!("read_container").entered();
            read_container(container)?
        };

        let raster = {
            let _span = tracing::info_span!("reconstruct", levels = pyramid.num_levels()).entered();
            self.codec.reconstruct(&pyramid)?
        };

        {
            let _span = tracing::info_span!("encode_image").entered();
            self.writer.write_raster(&raster, output, &self.config)?;
        }

        info!(
            width = raster.width(),
            height = raster.height(),
            "Decode complete"
        );
        Ok(raster)
    }

    /// Compresses `input_path` to `compressed_path`, then restores the image from
    /// that file into `decompressed_path`.
    #[instrument(skip(self, input_path, compressed_path, decompressed_path))]
    pub fn round_trip_file<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<Path>>(
        &self,
        input_path: P,
        compressed_path: Q,
        decompressed_path: S,
    ) -> Result<RoundTripReport> {
        let input_path = input_path.as_ref();
        let compressed_path = compressed_path.as_ref();
        let decompressed_path = decompressed_path.as_ref();

        info!(
            input = %input_path.display(),
            compressed = %compressed_path.display(),
            decompressed = %decompressed_path.display(),
            "Round-tripping file"
        );

        let mut timings = PipelineTimings::new();

        let input_data = timings.time("read_input", || {
            std::fs::read(input_path).map_err(|e| {
                CodecError::InputReadError(format!("{}: {}", input_path.display(), e))
            })
        })?;

        let source = timings.time("decode_image", || self.decode_image(&input_data))?;
        let dimensions = source.dimensions()?;

        let (pyramid, stats) =
            timings.time("build_pyramid", || self.codec.build_with_stats(&source))?;

        let container_len = timings.time("write_container", || {
            let bytes = container_bytes(&pyramid)?;
            std::fs::write(compressed_path, &bytes).map_err(|e| {
                CodecError::OutputWriteError(format!("{}: {}", compressed_path.display(), e))
            })?;
            Ok::<_, CodecError>(bytes.len())
        })?;

        let stored = timings.time("read_container", || read_container_file(compressed_path))?;
        let restored = timings.time("reconstruct", || self.codec.reconstruct(&stored))?;

        timings.time("encode_image", || {
            let mut output_file = std::fs::File::create(decompressed_path).map_err(|e| {
                CodecError::OutputWriteError(format!("{}: {}", decompressed_path.display(), e))
            })?;
            self.writer.write_raster(&restored, &mut output_file, &self.config)
        })?;

        let error = timings.time("metrics", || mse(&source, &restored))?;

        let report = RoundTripReport {
            input: input_path.to_path_buf(),
            dimensions,
            stats,
            input_bytes: input_data.len(),
            container_bytes: container_len,
            mse: error,
            psnr: psnr(error),
            timings,
        };

        info!(
            levels = report.stats.num_levels,
            escapes = report.stats.escapes,
            container_bytes = report.container_bytes,
            ratio = format!("{:.3}", report.compression_ratio()),
            bpp = format!("{:.3}", report.bits_per_pixel()),
            mse = report.mse,
            psnr = format!("{:.2}", report.psnr),
            "Round trip complete"
        );
        report.timings.log_summary();

        Ok(report)
    }

    /// Round-trips every matching file of `input_dir`, in file name order.
    ///
    /// Writes `<stem>.pyr` into `compressed_dir` and `<file name>` into
    /// `decompressed_dir`. Images that are not 8-bit are skipped; other per-file
    /// failures are logged and counted without stopping the batch.
    #[instrument(skip(self, input_dir, compressed_dir, decompressed_dir))]
    pub fn process_directory<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<Path>>(
        &self,
        input_dir: P,
        compressed_dir: Q,
        decompressed_dir: S,
    ) -> Result<BatchSummary> {
        let input_dir = input_dir.as_ref();
        let compressed_dir = compressed_dir.as_ref();
        let decompressed_dir = decompressed_dir.as_ref();

        let inputs = self.collect_inputs(input_dir)?;
        info!(
            input = %input_dir.display(),
            files = inputs.len(),
            "Processing directory"
        );

        for dir in [compressed_dir, decompressed_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                CodecError::OutputWriteError(format!("{}: {}", dir.display(), e))
            })?;
        }

        let mut summary = BatchSummary::default();
        for path in inputs {
            let (Some(stem), Some(file_name)) = (path.file_stem(), path.file_name()) else {
                continue;
            };
            let mut container_name = OsString::from(stem);
            container_name.push(".");
            container_name.push(CONTAINER_EXTENSION);

            info!(image = %path.display(), "Current image");
            match self.round_trip_file(
                &path,
                compressed_dir.join(container_name),
                decompressed_dir.join(file_name),
            ) {
                Ok(report) => {
                    summary.processed += 1;
                    summary.reports.push(report);
                }
                Err(CodecError::UnsupportedBitDepth(depth)) => {
                    warn!(image = %path.display(), depth, "Skipping image that is not 8-bit");
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(image = %path.display(), error = %e, "Round trip failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Directory complete"
        );
        Ok(summary)
    }

    fn collect_inputs(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(input_dir).map_err(|e| {
            CodecError::InputReadError(format!("{}: {}", input_dir.display(), e))
        })?;

        let mut inputs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| self.config.matches_extension(ext));
            if matches {
                inputs.push(path);
            }
        }
        inputs.sort();
        Ok(inputs)
    }

    pub fn codec(&self) -> &PyramidCodec<C> {
        &self.codec
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Replaces the configuration. Output compression and validation follow the
    /// new values; the payload compressor keeps the level it was built with.
    pub fn set_config(&mut self, config: CodecConfig) {
        self.config = config;
    }
}
