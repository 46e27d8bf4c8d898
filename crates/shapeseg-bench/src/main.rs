//! shapeseg-bench: CLI tool for comparing binarization strategies.
//!
//! Runs every segmentation strategy on a given image file with
//! configurable parameters and prints a comparison of the regions each
//! one finds. Useful for:
//!
//! - Comparing fixed, adaptive and Otsu thresholding on the same input
//! - Tuning the threshold, adaptive window and minimum region area
//! - Inspecting masks and annotated overlays for each strategy
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin shapeseg-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod annotate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::RgbImage;
use shapeseg_pipeline::{AnalysisReport, SegmentConfig};
use tracing_subscriber::EnvFilter;

/// Shape segmentation strategy comparison.
///
/// Binarizes the image with every strategy, traces and classifies the
/// regions, and prints a per-strategy comparison.
#[derive(Parser)]
#[command(name = "shapeseg-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Global threshold for the fixed strategy.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_FIXED_THRESHOLD)]
    fixed_threshold: u8,

    /// Adaptive neighbourhood size in pixels (odd, at least 3).
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_ADAPTIVE_BLOCK_SIZE)]
    block_size: u32,

    /// Constant subtracted from the adaptive neighbourhood mean.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_ADAPTIVE_C, allow_negative_numbers = true)]
    adaptive_c: i32,

    /// Simplification tolerance as a fraction of the boundary perimeter.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_EPSILON_FRACTION)]
    epsilon_fraction: f64,

    /// Regions with area at or below this are discarded.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_MIN_REGION_AREA)]
    min_area: f64,

    /// Run strategies one after another instead of in parallel.
    #[arg(long)]
    sequential: bool,

    /// Directory to write `<strategy>.png` masks and annotated overlays to.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Full segmentation config as a JSON string.
    ///
    /// When provided, all other config flags are ignored. Missing fields
    /// take their default values.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`SegmentConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<SegmentConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(SegmentConfig {
        fixed_threshold: cli.fixed_threshold,
        adaptive_block_size: cli.block_size,
        adaptive_c: cli.adaptive_c,
        epsilon_fraction: cli.epsilon_fraction,
        min_region_area: cli.min_area,
        parallel: !cli.sequential,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!();

    let start = Instant::now();
    let (rgb, report) = match shapeseg_pipeline::analyze_bytes(&image_bytes, &config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Segmentation error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "analysis complete"
    );

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", report.report());
        print_captions(&report);
    }

    if let Some(ref out_dir) = cli.out_dir
        && let Err(msg) = write_outputs(out_dir, &rgb, &report)
    {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the caption each region would carry on its overlay.
fn print_captions(report: &AnalysisReport) {
    println!("Captions\n{}", "-".repeat(60));
    for strategy_report in &report.strategies {
        let Ok(result) = &strategy_report.outcome else {
            continue;
        };
        for region in &result.regions {
            println!(
                "{:<20} @ ({:.0}, {:.0})  {}",
                strategy_report.strategy.name(),
                region.centroid.x,
                region.centroid.y,
                region.label_text(),
            );
        }
    }
}

/// Write the mask and annotated overlay of every successful strategy.
fn write_outputs(out_dir: &Path, rgb: &RgbImage, report: &AnalysisReport) -> Result<(), String> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Error creating {}: {e}", out_dir.display()))?;

    for strategy_report in &report.strategies {
        let (Some(mask), Ok(result)) = (&strategy_report.mask, &strategy_report.outcome) else {
            continue;
        };
        let strategy = strategy_report.strategy;

        let mask_path = out_dir.join(format!("{}.png", strategy.name()));
        mask.as_image()
            .save(&mask_path)
            .map_err(|e| format!("Error writing {}: {e}", mask_path.display()))?;

        let overlay_path = out_dir.join(format!("{}_annotated.png", strategy.name()));
        annotate::annotate(rgb, &result.regions)
            .save(&overlay_path)
            .map_err(|e| format!("Error writing {}: {e}", overlay_path.display()))?;

        eprintln!(
            "{strategy}: wrote {} and {}",
            mask_path.display(),
            overlay_path.display(),
        );
    }
    Ok(())
}
