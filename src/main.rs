use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use residual_pyramid::logger;
use residual_pyramid::pyramid_codec::{CodecConfig, DEFAULT_COMPRESSION_LEVEL, PyramidPipeline};

use tracing::{error, info};

/// Compresses every 8-bit grayscale TIFF of a folder into a residual pyramid,
/// then restores each image from its compressed file.
#[derive(Parser, Debug)]
#[command(name = "pyrcodec")]
#[command(about = "Residual pyramid compression of grayscale TIFF images")]
struct Args {
    /// Folder holding the .tif / .tiff inputs
    input_dir: PathBuf,

    /// Folder receiving one .pyr file per image
    compressed_dir: PathBuf,

    /// Folder receiving the restored images
    decompressed_dir: PathBuf,

    /// zstd level for the residual payload
    #[arg(short, long, default_value_t = DEFAULT_COMPRESSION_LEVEL,
          value_parser = clap::value_parser!(i32).range(1..=22))]
    level: i32,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(&args.log_level);

    info!("Starting pyrcodec...");

    let config = CodecConfig::builder()
        .compression_level(args.level)
        .build();
    let pipeline = PyramidPipeline::new(config)?;

    info!("Pyramid pipeline initialized");
    info!("Compression level: {}", pipeline.config().compression_level);

    match pipeline.process_directory(&args.input_dir, &args.compressed_dir, &args.decompressed_dir) {
        Ok(summary) => info!(
            "Done: {} processed, {} skipped, {} failed",
            summary.processed, summary.skipped, summary.failed
        ),
        Err(e) => error!("Processing failed: {}", e),
    }

    Ok(())
}
