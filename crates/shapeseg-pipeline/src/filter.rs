//! Region filtering by enclosed area.
//!
//! Drops traced boundaries too small to be shapes: isolated noise pixels,
//! thin slivers and one-pixel-wide lines all enclose little or no area.

use crate::describe::shoelace_area;
use crate::types::Boundary;

/// Keep only boundaries whose shoelace area is strictly greater than
/// `min_area`. Order is preserved.
#[must_use = "returns the retained boundaries"]
pub fn filter_by_area(boundaries: Vec<Boundary>, min_area: f64) -> Vec<Boundary> {
    let before = boundaries.len();
    let kept: Vec<Boundary> = boundaries
        .into_iter()
        .filter(|b| shoelace_area(b) > min_area)
        .collect();

    tracing::debug!(
        before,
        after = kept.len(),
        min_area,
        "filtered boundaries by area"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridPoint;

    fn rect(x0: u32, y0: u32, w: u32, h: u32) -> Boundary {
        Boundary::new(vec![
            GridPoint::new(x0, y0),
            GridPoint::new(x0 + w, y0),
            GridPoint::new(x0 + w, y0 + h),
            GridPoint::new(x0, y0 + h),
        ])
    }

    #[test]
    fn small_boundaries_are_dropped() {
        let kept = filter_by_area(vec![rect(0, 0, 10, 10), rect(0, 0, 30, 30)], 500.0);
        assert_eq!(kept, vec![rect(0, 0, 30, 30)]);
    }

    #[test]
    fn threshold_is_exclusive() {
        // 20 x 25 = exactly 500.
        assert!(filter_by_area(vec![rect(0, 0, 20, 25)], 500.0).is_empty());
        assert_eq!(filter_by_area(vec![rect(0, 0, 20, 25)], 499.0).len(), 1);
    }

    #[test]
    fn single_point_boundary_is_dropped() {
        let kept = filter_by_area(vec![Boundary::new(vec![GridPoint::new(3, 3)])], 0.0);
        assert!(kept.is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let input = vec![rect(50, 0, 40, 40), rect(0, 0, 5, 5), rect(0, 50, 30, 30)];
        let kept = filter_by_area(input, 500.0);
        assert_eq!(kept, vec![rect(50, 0, 40, 40), rect(0, 50, 30, 30)]);
    }
}
