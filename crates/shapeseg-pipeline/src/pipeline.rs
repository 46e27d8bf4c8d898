//! Orchestration: run every binarization strategy over one image.
//!
//! Each strategy owns its mask, boundaries and regions, so the four runs
//! share nothing but the read-only input raster and config. They are
//! mapped over rayon's pool when [`SegmentConfig::parallel`] is set and
//! collected back in [`Strategy::ALL`] order, so the report is identical
//! whether or not the runs overlap.
//!
//! Results are plain values: nothing is accumulated across calls.

use std::fmt::Write as _;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::binarize::{Binarizer, Strategy};
use crate::contour::trace;
use crate::describe::describe;
use crate::filter::filter_by_area;
use crate::grayscale::{decode_rgb_and_grayscale, ensure_non_empty};
use crate::simplify::simplify;
use crate::types::{
    BinaryMask, Dimensions, GrayImage, Region, RgbImage, SegmentConfig, SegmentError,
    StrategyResult,
};

/// Outcome of one strategy: its mask (when binarization succeeded) and
/// either its regions or the error that aborted it.
#[derive(Debug, Serialize, Deserialize)]
pub struct StrategyReport {
    /// The strategy this report belongs to.
    pub strategy: Strategy,
    /// The binary mask the regions were traced from. Not serialized.
    #[serde(skip)]
    pub mask: Option<BinaryMask>,
    /// Regions and aggregates, or the error that stopped this strategy.
    pub outcome: Result<StrategyResult, SegmentError>,
}

/// One line of the strategy comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Strategy compared.
    pub strategy: Strategy,
    /// Number of regions found.
    pub count: usize,
    /// Sum of region areas.
    pub total_area: f64,
    /// Mean region area.
    pub mean_area: f64,
}

/// Results of every strategy over one image.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Dimensions of the analyzed image.
    pub dimensions: Dimensions,
    /// One report per strategy in [`Strategy::ALL`] order.
    pub strategies: Vec<StrategyReport>,
}

impl AnalysisReport {
    /// The report for `strategy`, if it was run.
    #[must_use]
    pub fn get(&self, strategy: Strategy) -> Option<&StrategyReport> {
        self.strategies.iter().find(|r| r.strategy == strategy)
    }

    /// Comparative totals for every strategy that succeeded.
    #[must_use]
    pub fn comparison(&self) -> Vec<ComparisonRow> {
        self.strategies
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|result| ComparisonRow {
                strategy: result.strategy,
                count: result.count(),
                total_area: result.total_area(),
                mean_area: result.mean_area(),
            })
            .collect()
    }

    /// Human-readable comparison table followed by one line per region.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Shape Segmentation Report\n{}", "=".repeat(60));
        let _ = writeln!(
            out,
            "Image: {}x{}\n",
            self.dimensions.width, self.dimensions.height
        );
        let _ = writeln!(
            out,
            "{:<22} | {:>7} | {:>11} | {:>9}",
            "Strategy", "Regions", "Total area", "Mean area"
        );
        let _ = writeln!(out, "{}", "-".repeat(60));

        for report in &self.strategies {
            match &report.outcome {
                Ok(result) => {
                    let _ = writeln!(
                        out,
                        "{:<22} | {:>7} | {:>11.0} | {:>9.0}",
                        report.strategy,
                        result.count(),
                        result.total_area(),
                        result.mean_area(),
                    );
                }
                Err(e) => {
                    let _ = writeln!(out, "{:<22} | error: {e}", report.strategy);
                }
            }
        }

        for result in self.strategies.iter().filter_map(|r| r.outcome.as_ref().ok()) {
            let threshold = result
                .threshold
                .map_or_else(String::new, |t| format!(", threshold {t}"));
            let _ = writeln!(
                out,
                "\n{} ({} of {} traced{threshold})",
                result.strategy,
                result.count(),
                result.traced_count,
            );
            for (i, region) in result.regions.iter().enumerate() {
                let _ = writeln!(out, "  #{i:<3} {}", describe_line(region));
            }
        }

        out
    }
}

fn describe_line(region: &Region) -> String {
    let bb = region.bounding_box;
    format!(
        "{:<20} area {:>8.0}  perimeter {:>7.1}  centroid ({:.1}, {:.1})  bbox {}x{}+{}+{}  vertices {}",
        region.shape.to_string(),
        region.area,
        region.perimeter,
        region.centroid.x,
        region.centroid.y,
        bb.width,
        bb.height,
        bb.x,
        bb.y,
        region.vertex_count,
    )
}

/// Run one strategy end to end: binarize, trace, filter by area, then
/// simplify, describe and classify each surviving boundary.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidInput`] if `gray` has a zero dimension.
pub fn segment(
    gray: &GrayImage,
    strategy: Strategy,
    config: &SegmentConfig,
) -> Result<(BinaryMask, StrategyResult), SegmentError> {
    let _span = tracing::info_span!("strategy", strategy = strategy.name()).entered();

    let binarized = strategy.binarize(gray, config)?;
    tracing::debug!(
        foreground = binarized.mask.foreground_count(),
        threshold = binarized.threshold,
        "binarized"
    );

    let traced = trace(&binarized.mask);
    let traced_count = traced.len();
    let kept = filter_by_area(traced, config.min_region_area);

    let regions: Vec<Region> = kept
        .into_iter()
        .map(|boundary| {
            let simplified = simplify(&boundary, config.epsilon_fraction);
            describe(boundary, simplified)
        })
        .collect();

    let result = StrategyResult {
        strategy,
        threshold: binarized.threshold,
        traced_count,
        regions,
    };
    tracing::info!(
        regions = result.count(),
        traced = traced_count,
        total_area = result.total_area(),
        "strategy finished"
    );
    Ok((binarized.mask, result))
}

/// Run all four strategies over `gray` and collect their results.
///
/// A failing strategy is reported in its own [`StrategyReport`]; the
/// others are unaffected.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidConfig`] if `config` fails
/// [`SegmentConfig::validate`].
pub fn analyze(gray: &GrayImage, config: &SegmentConfig) -> Result<AnalysisReport, SegmentError> {
    config.validate()?;
    if let Err(e) = ensure_non_empty(gray.width(), gray.height()) {
        tracing::warn!("{e}");
    }

    let run = |&strategy: &Strategy| {
        let (mask, outcome) = match segment(gray, strategy, config) {
            Ok((mask, result)) => (Some(mask), Ok(result)),
            Err(e) => (None, Err(e)),
        };
        StrategyReport {
            strategy,
            mask,
            outcome,
        }
    };

    let strategies: Vec<StrategyReport> = if config.parallel {
        Strategy::ALL.par_iter().map(run).collect()
    } else {
        Strategy::ALL.iter().map(run).collect()
    };

    Ok(AnalysisReport {
        dimensions: Dimensions {
            width: gray.width(),
            height: gray.height(),
        },
        strategies,
    })
}

/// Decode raw image bytes and [`analyze`] their grayscale conversion.
///
/// Returns the decoded RGB image as the annotation base alongside the
/// report.
///
/// # Errors
///
/// Returns [`SegmentError::EmptyInput`] if `image_bytes` is empty,
/// [`SegmentError::ImageDecode`] if decoding fails, and
/// [`SegmentError::InvalidConfig`] if `config` is invalid.
pub fn analyze_bytes(
    image_bytes: &[u8],
    config: &SegmentConfig,
) -> Result<(RgbImage, AnalysisReport), SegmentError> {
    let (rgb, gray) = decode_rgb_and_grayscale(image_bytes)?;
    let report = analyze(&gray, config)?;
    Ok((rgb, report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::ShapeLabel;
    use crate::types::Point;

    /// Dark background with one bright `size`-pixel square at `(x0, y0)`.
    fn square_scene(size: u32, x0: u32, y0: u32) -> GrayImage {
        GrayImage::from_fn(200, 160, |x, y| {
            let inside = (x0..x0 + size).contains(&x) && (y0..y0 + size).contains(&y);
            image::Luma([if inside { 230 } else { 20 }])
        })
    }

    #[test]
    fn fixed_square_yields_one_quadrilateral() {
        let gray = square_scene(100, 40, 30);
        let (mask, result) = segment(&gray, Strategy::Fixed, &SegmentConfig::default()).unwrap();
        assert_eq!(mask.foreground_count(), 10_000);
        assert_eq!(result.count(), 1);

        let region = &result.regions[0];
        assert_eq!(region.vertex_count, 4);
        assert_eq!(region.shape, ShapeLabel::Quadrilateral);
        // Pixel-center polygon of a 100 px square spans 99 x 99.
        assert!((region.area - 10_000.0).abs() <= 2.0 * 100.0, "area {}", region.area);
        assert!((region.area - 9801.0).abs() < 1e-9);
        assert!(region.centroid.distance(Point::new(89.5, 79.5)) < 1e-9);
        assert!(region.bounding_box.contains(region.centroid));
    }

    #[test]
    fn small_regions_are_filtered_out() {
        let gray = square_scene(10, 40, 30);
        let (_, result) = segment(&gray, Strategy::Fixed, &SegmentConfig::default()).unwrap();
        assert_eq!(result.traced_count, 1);
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn every_region_exceeds_min_area() {
        let gray = square_scene(60, 20, 20);
        let config = SegmentConfig::default();
        let report = analyze(&gray, &config).unwrap();
        for strategy_report in &report.strategies {
            let result = strategy_report.outcome.as_ref().unwrap();
            for region in &result.regions {
                assert!(region.area > config.min_region_area);
            }
        }
    }

    #[test]
    fn analyze_reports_every_strategy_in_order() {
        let report = analyze(&square_scene(80, 50, 40), &SegmentConfig::default()).unwrap();
        let order: Vec<Strategy> = report.strategies.iter().map(|r| r.strategy).collect();
        assert_eq!(order, Strategy::ALL.to_vec());
        assert_eq!(
            report.dimensions,
            Dimensions {
                width: 200,
                height: 160
            }
        );
        assert!(report.strategies.iter().all(|r| r.mask.is_some()));
        assert_eq!(report.comparison().len(), 4);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let gray = square_scene(70, 30, 50);
        let parallel = analyze(&gray, &SegmentConfig::default()).unwrap();
        let sequential = analyze(
            &gray,
            &SegmentConfig {
                parallel: false,
                ..SegmentConfig::default()
            },
        )
        .unwrap();
        assert_eq!(parallel.comparison(), sequential.comparison());
        for (a, b) in parallel.strategies.iter().zip(&sequential.strategies) {
            assert_eq!(a.outcome.as_ref().unwrap(), b.outcome.as_ref().unwrap());
        }
    }

    #[test]
    fn empty_image_fails_each_strategy() {
        let report = analyze(&GrayImage::new(0, 0), &SegmentConfig::default()).unwrap();
        assert_eq!(report.strategies.len(), 4);
        for r in &report.strategies {
            assert!(matches!(
                r.outcome,
                Err(SegmentError::InvalidInput {
                    width: 0,
                    height: 0
                })
            ));
            assert!(r.mask.is_none());
        }
        assert!(report.comparison().is_empty());
    }

    #[test]
    fn invalid_config_aborts_analysis() {
        let config = SegmentConfig {
            adaptive_block_size: 4,
            ..SegmentConfig::default()
        };
        let result = analyze(&square_scene(50, 10, 10), &config);
        assert!(matches!(result, Err(SegmentError::InvalidConfig(_))));
    }

    #[test]
    fn analyze_bytes_rejects_empty_input() {
        let result = analyze_bytes(&[], &SegmentConfig::default());
        assert!(matches!(result, Err(SegmentError::EmptyInput)));
    }

    #[test]
    fn report_lists_strategies_and_regions() {
        let report = analyze(&square_scene(100, 40, 30), &SegmentConfig::default()).unwrap();
        let text = report.report();
        for strategy in Strategy::ALL {
            assert!(text.contains(&strategy.to_string()), "missing {strategy}");
        }
        assert!(text.contains("Quadrilateral"));
        assert!(text.contains("threshold 127"));
    }

    #[test]
    fn report_serializes_without_masks() {
        let report = analyze(&square_scene(100, 40, 30), &SegmentConfig::default()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert!(back.strategies.iter().all(|r| r.mask.is_none()));
        assert_eq!(back.comparison(), report.comparison());
    }
}
