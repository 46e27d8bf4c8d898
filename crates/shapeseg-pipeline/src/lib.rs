//! shapeseg-pipeline: shape segmentation and contour analysis (sans-IO).
//!
//! Segments a grayscale raster into foreground regions and describes each
//! one geometrically:
//! binarize -> trace outer boundaries -> filter by area ->
//! simplify -> describe -> classify.
//!
//! Four binarization strategies (fixed, adaptive mean, adaptive Gaussian
//! and Otsu) are run side by side by [`analyze`] so their results can be
//! compared. This crate has **no I/O dependencies**: it operates on
//! in-memory images and byte slices. Writing masks and overlays lives in
//! `shapeseg-bench`.

pub mod binarize;
pub mod classify;
pub mod contour;
pub mod describe;
pub mod filter;
pub mod grayscale;
pub mod pipeline;
pub mod simplify;
pub mod types;

pub use binarize::{Binarized, Binarizer, Strategy};
pub use classify::ShapeLabel;
pub use pipeline::{AnalysisReport, ComparisonRow, StrategyReport, analyze, analyze_bytes, segment};
pub use types::{
    BinaryMask, Boundary, BoundingBox, Dimensions, GridPoint, Point, Region, SegmentConfig,
    SegmentError, StrategyResult,
};
