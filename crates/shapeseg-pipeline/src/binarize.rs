//! Binarization: turn a grayscale image into a foreground/background mask.
//!
//! This module defines the [`Binarizer`] trait for pluggable thresholding
//! rules and the [`Strategy`] enum naming the four rules the pipeline
//! compares:
//!
//! - [`Strategy::Fixed`]: one global threshold.
//! - [`Strategy::AdaptiveMean`] / [`Strategy::AdaptiveGaussian`]: a
//!   per-pixel threshold from the local neighbourhood, inverted so that
//!   pixels darker than their surroundings become foreground.
//! - [`Strategy::Otsu`]: a global threshold chosen from the histogram.
//!
//! Every strategy is a pure function of the input raster.

use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::grayscale::ensure_non_empty;
use crate::types::{BinaryMask, SegmentConfig, SegmentError};

/// Selects which thresholding rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Foreground where intensity is at or above
    /// [`SegmentConfig::fixed_threshold`].
    Fixed,
    /// Foreground where intensity is at or below the arithmetic mean of the
    /// surrounding block minus [`SegmentConfig::adaptive_c`].
    AdaptiveMean,
    /// Like [`AdaptiveMean`](Self::AdaptiveMean) with a Gaussian-weighted
    /// neighbourhood mean.
    AdaptiveGaussian,
    /// Foreground where intensity exceeds the threshold that maximizes
    /// between-class variance.
    Otsu,
}

impl Strategy {
    /// All strategies in reporting order.
    pub const ALL: [Self; 4] = [
        Self::Fixed,
        Self::AdaptiveMean,
        Self::AdaptiveGaussian,
        Self::Otsu,
    ];

    /// Machine-friendly identifier, used for output file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::AdaptiveMean => "adaptive_mean",
            Self::AdaptiveGaussian => "adaptive_gaussian",
            Self::Otsu => "otsu",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Self::Fixed => "Fixed threshold",
            Self::AdaptiveMean => "Adaptive (mean)",
            Self::AdaptiveGaussian => "Adaptive (Gaussian)",
            Self::Otsu => "Otsu",
        };
        f.pad(title)
    }
}

/// Output of a binarization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binarized {
    /// The 0/255 mask.
    pub mask: BinaryMask,
    /// The global threshold applied, for strategies that use one.
    pub threshold: Option<u8>,
}

/// Trait for binarization strategies.
///
/// Input: a single-channel intensity image.
/// Output: a mask of identical dimensions.
pub trait Binarizer {
    /// Binarize `gray` using the parameters in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidInput`] if the image has a zero
    /// dimension.
    fn binarize(
        &self,
        gray: &GrayImage,
        config: &SegmentConfig,
    ) -> Result<Binarized, SegmentError>;
}

impl Binarizer for Strategy {
    fn binarize(
        &self,
        gray: &GrayImage,
        config: &SegmentConfig,
    ) -> Result<Binarized, SegmentError> {
        ensure_non_empty(gray.width(), gray.height())?;

        Ok(match *self {
            Self::Fixed => Binarized {
                mask: fixed_threshold(gray, config.fixed_threshold),
                threshold: Some(config.fixed_threshold),
            },
            Self::AdaptiveMean => Binarized {
                mask: adaptive_threshold(
                    gray,
                    &mean_kernel(config.adaptive_block_size),
                    config.adaptive_c,
                ),
                threshold: None,
            },
            Self::AdaptiveGaussian => Binarized {
                mask: adaptive_threshold(
                    gray,
                    &gaussian_kernel(config.adaptive_block_size),
                    config.adaptive_c,
                ),
                threshold: None,
            },
            Self::Otsu => {
                let level = otsu_level(gray);
                Binarized {
                    mask: BinaryMask::from_fn(gray.width(), gray.height(), |x, y| {
                        gray.get_pixel(x, y).0[0] > level
                    }),
                    threshold: Some(level),
                }
            }
        })
    }
}

/// Global threshold: foreground where `pixel >= threshold`.
#[must_use = "returns the binary mask"]
pub fn fixed_threshold(gray: &GrayImage, threshold: u8) -> BinaryMask {
    BinaryMask::from_fn(gray.width(), gray.height(), |x, y| {
        gray.get_pixel(x, y).0[0] >= threshold
    })
}

/// Inverted local threshold: foreground where the pixel is at or below
/// the weighted neighbourhood mean minus `c`.
///
/// `kernel` is applied separably along both axes; pixels beyond the image
/// edge replicate the nearest edge pixel.
#[must_use = "returns the binary mask"]
pub fn adaptive_threshold(gray: &GrayImage, kernel: &[f32], c: i32) -> BinaryMask {
    let means = neighbourhood_mean(gray, kernel);
    let width = gray.width();
    #[allow(clippy::cast_precision_loss)]
    let offset = c as f32;

    BinaryMask::from_fn(width, gray.height(), |x, y| {
        let idx = y as usize * width as usize + x as usize;
        f32::from(gray.get_pixel(x, y).0[0]) <= means[idx] - offset
    })
}

/// Uniform weights for a `block_size`-wide box.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_kernel(block_size: u32) -> Vec<f32> {
    let n = block_size.max(1) as usize;
    vec![1.0 / n as f32; n]
}

/// Normalized 1D Gaussian weights for a `block_size`-wide window.
///
/// Sigma is derived from the window size as
/// `0.3 * ((block_size - 1) * 0.5 - 1) + 0.8`, which gives 2.0 for the
/// default 11-pixel block.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gaussian_kernel(block_size: u32) -> Vec<f32> {
    let n = block_size.max(1) as usize;
    let radius = (n / 2) as f32;
    let sigma = 0.3f32.mul_add((n as f32 - 1.0).mul_add(0.5, -1.0), 0.8);
    let two_sigma_sq = 2.0 * sigma * sigma;

    let weights: Vec<f32> = (0..n)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Separable weighted mean with replicated borders, row-major output.
fn neighbourhood_mean(gray: &GrayImage, kernel: &[f32]) -> Vec<f32> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let radius = kernel.len() / 2;
    let src = gray.as_raw();

    let clamp = |i: usize, offset: usize, len: usize| {
        (i + offset).saturating_sub(radius).min(len - 1)
    };

    let mut horizontal = vec![0.0f32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * f32::from(row[clamp(x, k, width)]))
                .sum();
        }
    }

    let mut out = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * horizontal[clamp(y, k, height) * width + x])
                .sum();
        }
    }
    out
}

/// Otsu's method: the threshold `t` that maximizes the between-class
/// variance of the split `{<= t}` / `{> t}`.
///
/// All 256 candidates are evaluated. When a run of consecutive
/// candidates ties for the maximum (empty bins between two clusters), the
/// middle of the run is returned so the level sits between the clusters.
/// A single-valued image returns that value.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let histogram = imageproc::stats::histogram(gray);
    let bins = &histogram.channels[0];

    let total: f64 = bins.iter().map(|&c| f64::from(c)).sum();
    let weighted_total: f64 = bins
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * f64::from(c))
        .sum();

    let mut background_weight = 0.0;
    let mut background_sum = 0.0;
    let mut best_variance = -1.0f64;
    let mut plateau: Option<(usize, usize)> = None;
    let mut plateau_open = false;

    for (t, &count) in bins.iter().enumerate() {
        background_weight += f64::from(count);
        background_sum += t as f64 * f64::from(count);
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }

        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight;
        let diff = background_mean - foreground_mean;
        let variance = background_weight * foreground_weight * diff * diff;

        let tolerance = best_variance.abs() * 1e-12;
        if variance > best_variance + tolerance {
            best_variance = variance;
            plateau = Some((t, t));
            plateau_open = true;
        } else if plateau_open && (variance - best_variance).abs() <= tolerance {
            if let Some((_, last)) = plateau.as_mut() {
                *last = t;
            }
        } else {
            plateau_open = false;
        }
    }

    match plateau {
        Some((first, last)) => ((first + last) / 2) as u8,
        // Zero or one populated bin: nothing to separate.
        None => bins.iter().position(|&c| c > 0).unwrap_or(0) as u8,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Image split into two flat intensity clusters along x.
    fn two_cluster_image(low: u8, high: u8) -> GrayImage {
        GrayImage::from_fn(40, 20, |x, _| image::Luma([if x < 25 { low } else { high }]))
    }

    fn config() -> SegmentConfig {
        SegmentConfig::default()
    }

    #[test]
    fn strategy_names_are_distinct() {
        let mut names: Vec<_> = Strategy::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert_eq!(Strategy::AdaptiveGaussian.to_string(), "Adaptive (Gaussian)");
    }

    #[test]
    fn zero_dimension_image_is_rejected_by_every_strategy() {
        let empty = GrayImage::new(0, 5);
        for strategy in Strategy::ALL {
            let result = strategy.binarize(&empty, &config());
            assert!(
                matches!(
                    result,
                    Err(SegmentError::InvalidInput {
                        width: 0,
                        height: 5
                    })
                ),
                "{strategy} accepted an empty image"
            );
        }
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = two_cluster_image(10, 240);
        for strategy in Strategy::ALL {
            let out = strategy.binarize(&img, &config()).unwrap();
            assert_eq!(out.mask.width(), 40);
            assert_eq!(out.mask.height(), 20);
        }
    }

    #[test]
    fn fixed_threshold_is_inclusive() {
        let img = GrayImage::from_fn(3, 1, |x, _| image::Luma([[126, 127, 128][x as usize]]));
        let mask = fixed_threshold(&img, 127);
        assert!(!mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(mask.is_foreground(2, 0));
    }

    #[test]
    fn fixed_strategy_reports_its_threshold() {
        let out = Strategy::Fixed
            .binarize(&two_cluster_image(0, 255), &config())
            .unwrap();
        assert_eq!(out.threshold, Some(127));
        assert_eq!(out.mask.foreground_count(), 15 * 20);
    }

    #[test]
    fn otsu_level_falls_between_cluster_means() {
        let img = two_cluster_image(50, 200);
        let level = otsu_level(&img);
        assert!(level > 50 && level < 200, "level {level} not between clusters");
    }

    #[test]
    fn otsu_level_between_noisy_clusters() {
        // Two clusters spread over a few bins each.
        let img = GrayImage::from_fn(60, 10, |x, y| {
            let jitter = u8::try_from((x + y) % 7).unwrap();
            image::Luma([if x < 30 { 40 + jitter } else { 170 + jitter }])
        });
        let level = otsu_level(&img);
        assert!(level > 43 && level < 173, "level {level}");
    }

    #[test]
    fn otsu_uniform_image_selects_that_value() {
        let img = GrayImage::from_pixel(8, 8, image::Luma([90]));
        assert_eq!(otsu_level(&img), 90);
        let out = Strategy::Otsu.binarize(&img, &config()).unwrap();
        assert_eq!(out.mask.foreground_count(), 0);
    }

    #[test]
    fn otsu_marks_bright_cluster_as_foreground() {
        let out = Strategy::Otsu
            .binarize(&two_cluster_image(50, 200), &config())
            .unwrap();
        assert!(!out.mask.is_foreground(0, 0));
        assert!(out.mask.is_foreground(39, 0));
    }

    #[test]
    fn kernels_are_normalized() {
        for kernel in [mean_kernel(11), gaussian_kernel(11), gaussian_kernel(3)] {
            let total: f32 = kernel.iter().sum();
            assert!((total - 1.0).abs() < 1e-5, "kernel sums to {total}");
        }
    }

    #[test]
    fn gaussian_kernel_is_symmetric_and_peaked() {
        let kernel = gaussian_kernel(11);
        assert_eq!(kernel.len(), 11);
        for i in 0..5 {
            assert!((kernel[i] - kernel[10 - i]).abs() < 1e-7);
            assert!(kernel[i] < kernel[i + 1]);
        }
    }

    #[test]
    fn adaptive_uniform_image_has_no_foreground() {
        let img = GrayImage::from_pixel(30, 30, image::Luma([128]));
        for strategy in [Strategy::AdaptiveMean, Strategy::AdaptiveGaussian] {
            let out = strategy.binarize(&img, &config()).unwrap();
            assert_eq!(out.mask.foreground_count(), 0);
            assert_eq!(out.threshold, None);
        }
    }

    #[test]
    fn adaptive_marks_dark_side_of_an_edge() {
        // Dark stripe on a bright background: the dark pixels next to the
        // edge are below their local mean, the bright ones are not.
        let img = GrayImage::from_fn(30, 30, |x, _| {
            image::Luma([if (10..20).contains(&x) { 30 } else { 220 }])
        });
        for strategy in [Strategy::AdaptiveMean, Strategy::AdaptiveGaussian] {
            let mask = strategy.binarize(&img, &config()).unwrap().mask;
            assert!(mask.is_foreground(10, 15), "{strategy}");
            assert!(mask.is_foreground(19, 15), "{strategy}");
            assert!(!mask.is_foreground(9, 15), "{strategy}");
            assert!(!mask.is_foreground(2, 15), "{strategy}");
        }
    }
}
