//! Shared types for the shapeseg segmentation pipeline.

use serde::{Deserialize, Serialize};

use crate::binarize::Strategy;
use crate::classify::ShapeLabel;

/// Re-export `GrayImage` so downstream crates can hand grayscale rasters
/// to the pipeline without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the color
/// overlay base without depending on `image` directly.
pub use image::RgbImage;

/// A 2D point in image coordinates with sub-pixel precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An integer pixel coordinate on a traced boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl GridPoint {
    /// Create a new grid point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The pixel center as a real-valued [`Point`].
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }

    /// Whether `other` is one of the eight neighbours of this pixel.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx <= 1 && dy <= 1 && (dx | dy) != 0
    }
}

/// An ordered, implicitly closed sequence of pixel coordinates outlining
/// one region.
///
/// The last point connects back to the first. Traced boundaries run
/// clockwise (in image coordinates, y pointing down) and never repeat a
/// point consecutively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary(Vec<GridPoint>);

impl Boundary {
    /// Create a new boundary from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<GridPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the boundary has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the boundary.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[GridPoint] {
        &self.0
    }

    /// Iterate over the closing edges `(p[i], p[i + 1])`, including the
    /// edge from the last point back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (GridPoint, GridPoint)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }
}

/// Axis-aligned bounding box of a region in pixels.
///
/// `width` and `height` count pixels inclusively, so a single pixel has
/// a 1x1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Returns `true` if `point` lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let right = f64::from(self.x) + f64::from(self.width.saturating_sub(1));
        let bottom = f64::from(self.y) + f64::from(self.height.saturating_sub(1));
        point.x >= f64::from(self.x)
            && point.x <= right
            && point.y >= f64::from(self.y)
            && point.y <= bottom
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A binary foreground/background mask.
///
/// Stored as a `GrayImage` whose pixels are either 0 (background) or
/// 255 (foreground), which keeps it directly encodable as a PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Foreground pixel value.
    pub const FOREGROUND: u8 = 255;
    /// Background pixel value.
    pub const BACKGROUND: u8 = 0;

    /// Build a mask by evaluating `is_foreground` at every pixel.
    #[must_use]
    pub fn from_fn(
        width: u32,
        height: u32,
        mut is_foreground: impl FnMut(u32, u32) -> bool,
    ) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            image::Luma([if is_foreground(x, y) {
                Self::FOREGROUND
            } else {
                Self::BACKGROUND
            }])
        }))
    }

    /// Wrap an existing grayscale image, treating any non-zero pixel as
    /// foreground.
    #[must_use]
    pub fn from_image(image: &GrayImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| {
            image.get_pixel(x, y).0[0] != 0
        })
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Whether the pixel at `(x, y)` is foreground. Out-of-range
    /// coordinates are background.
    #[must_use]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        x < self.0.width() && y < self.0.height() && self.0.get_pixel(x, y).0[0] != 0
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> u64 {
        self.0.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
    }

    /// Borrow the underlying 0/255 raster.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }
}

/// A segmented shape with its geometric descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Traced outer boundary.
    pub boundary: Boundary,
    /// Douglas-Peucker reduced boundary used for classification.
    pub simplified: Boundary,
    /// Enclosed area (shoelace formula over `boundary`).
    pub area: f64,
    /// Closed arc length of `boundary`.
    pub perimeter: f64,
    /// First-order moment centroid, `(0, 0)` for zero-area boundaries.
    pub centroid: Point,
    /// Extent of `boundary`.
    pub bounding_box: BoundingBox,
    /// Number of vertices in `simplified`.
    pub vertex_count: usize,
    /// Shape category derived from `vertex_count`.
    pub shape: ShapeLabel,
}

impl Region {
    /// Caption drawn next to the region on annotated overlays,
    /// e.g. `"Triangle A:5000"`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn label_text(&self) -> String {
        format!("{} A:{}", self.shape, self.area as i64)
    }
}

/// The regions one binarization strategy produced, with aggregate stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    /// Which binarization strategy produced these regions.
    pub strategy: Strategy,
    /// Global threshold used, when the strategy has one (fixed, Otsu).
    pub threshold: Option<u8>,
    /// Number of boundaries traced before area filtering.
    pub traced_count: usize,
    /// Surviving regions in tracing order.
    pub regions: Vec<Region>,
}

impl StrategyResult {
    /// Number of regions.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.regions.len()
    }

    /// Sum of region areas.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.regions.iter().map(|r| r.area).sum()
    }

    /// Mean region area, 0 when there are no regions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_area(&self) -> f64 {
        if self.regions.is_empty() {
            0.0
        } else {
            self.total_area() / self.regions.len() as f64
        }
    }
}

/// Configuration for the segmentation pipeline.
///
/// Defaults: fixed threshold 127, an 11x11 adaptive block with offset 2,
/// a Douglas-Peucker tolerance of 2% of the perimeter and a 500 px²
/// minimum region area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Global threshold for [`Strategy::Fixed`]. Pixels at or above it are
    /// foreground.
    pub fixed_threshold: u8,

    /// Side length of the square neighbourhood used by the adaptive
    /// strategies. Must be odd and at least 3.
    pub adaptive_block_size: u32,

    /// Constant subtracted from the neighbourhood aggregate by the adaptive
    /// strategies.
    pub adaptive_c: i32,

    /// Douglas-Peucker tolerance as a fraction of the boundary perimeter.
    pub epsilon_fraction: f64,

    /// Regions with area at or below this many square pixels are dropped.
    pub min_region_area: f64,

    /// Run the four strategies on the rayon thread pool.
    pub parallel: bool,
}

impl SegmentConfig {
    /// Default [`fixed_threshold`](Self::fixed_threshold).
    pub const DEFAULT_FIXED_THRESHOLD: u8 = 127;
    /// Default [`adaptive_block_size`](Self::adaptive_block_size).
    pub const DEFAULT_ADAPTIVE_BLOCK_SIZE: u32 = 11;
    /// Default [`adaptive_c`](Self::adaptive_c).
    pub const DEFAULT_ADAPTIVE_C: i32 = 2;
    /// Default [`epsilon_fraction`](Self::epsilon_fraction).
    pub const DEFAULT_EPSILON_FRACTION: f64 = 0.02;
    /// Default [`min_region_area`](Self::min_region_area).
    pub const DEFAULT_MIN_REGION_AREA: f64 = 500.0;

    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidConfig`] if the adaptive block size is
    /// even or smaller than 3, or if the epsilon fraction or minimum area is
    /// negative or not finite.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return Err(SegmentError::InvalidConfig(format!(
                "adaptive_block_size must be odd and >= 3, got {}",
                self.adaptive_block_size
            )));
        }
        if !self.epsilon_fraction.is_finite() || self.epsilon_fraction < 0.0 {
            return Err(SegmentError::InvalidConfig(format!(
                "epsilon_fraction must be finite and >= 0, got {}",
                self.epsilon_fraction
            )));
        }
        if !self.min_region_area.is_finite() || self.min_region_area < 0.0 {
            return Err(SegmentError::InvalidConfig(format!(
                "min_region_area must be finite and >= 0, got {}",
                self.min_region_area
            )));
        }
        Ok(())
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            fixed_threshold: Self::DEFAULT_FIXED_THRESHOLD,
            adaptive_block_size: Self::DEFAULT_ADAPTIVE_BLOCK_SIZE,
            adaptive_c: Self::DEFAULT_ADAPTIVE_C,
            epsilon_fraction: Self::DEFAULT_EPSILON_FRACTION,
            min_region_area: Self::DEFAULT_MIN_REGION_AREA,
            parallel: true,
        }
    }
}

/// Errors that can occur during segmentation.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image has a zero dimension.
    #[error("invalid input image: {width}x{height} has no pixels")]
    InvalidInput {
        /// Width of the offending image.
        width: u32,
        /// Height of the offending image.
        height: u32,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid segmentation configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `SegmentError`.
///
/// A deserialized `ImageDecode` comes back as `InvalidConfig` carrying the
/// original message, since the typed `image::ImageError` cannot be rebuilt.
#[derive(Serialize, Deserialize)]
enum SegmentErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidInput { width: u32, height: u32 },
    InvalidConfig(String),
}

impl Serialize for SegmentError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => SegmentErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => SegmentErrorProxy::EmptyInput,
            Self::InvalidInput { width, height } => SegmentErrorProxy::InvalidInput {
                width: *width,
                height: *height,
            },
            Self::InvalidConfig(s) => SegmentErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SegmentError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = SegmentErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            SegmentErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            SegmentErrorProxy::EmptyInput => Self::EmptyInput,
            SegmentErrorProxy::InvalidInput { width, height } => {
                Self::InvalidInput { width, height }
            }
            SegmentErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}
