//! Boundary simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces a traced boundary to the handful of corner points that drive
//! shape classification. Boundaries are closed, so the loop is first cut
//! at the point farthest from the start and each half is simplified as an
//! open chain.
//!
//! Simplifying an already simplified boundary with the same fraction
//! returns it unchanged: its perimeter can only be shorter, so the
//! tolerance can only shrink, and every surviving point was a split point.

use crate::describe::perimeter;
use crate::types::{Boundary, GridPoint, Point};

/// Simplify a closed boundary with a tolerance of
/// `epsilon_fraction * perimeter(boundary)`.
///
/// Boundaries with fewer than 3 points are returned unchanged.
#[must_use = "returns the simplified boundary"]
pub fn simplify(boundary: &Boundary, epsilon_fraction: f64) -> Boundary {
    simplify_closed(boundary, epsilon_fraction * perimeter(boundary))
}

/// Simplify a closed boundary with an absolute tolerance in pixels.
///
/// The first point is always kept. Ties for the farthest point resolve to
/// the earliest index, so the result is deterministic.
#[must_use = "returns the simplified boundary"]
pub fn simplify_closed(boundary: &Boundary, tolerance: f64) -> Boundary {
    let points = boundary.points();
    if points.len() < 3 {
        return boundary.clone();
    }

    let start = points[0].to_point();
    let mut split = 0;
    let mut max_dist = 0.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = p.to_point().distance_squared(start);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }

    // The loop as an open chain that returns to its start.
    let mut chain: Vec<GridPoint> = points.to_vec();
    chain.push(points[0]);
    let last = chain.len() - 1;

    let mut kept = vec![false; chain.len()];
    kept[0] = true;
    kept[split] = true;
    rdp(&chain, 0, split, tolerance, &mut kept);
    rdp(&chain, split, last, tolerance, &mut kept);

    let simplified = chain[..last]
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();
    Boundary::new(simplified)
}

/// Douglas-Peucker over `points[first..=last]`, marking retained indices.
///
/// Finds the point between the endpoints that is farthest from the line
/// through them. If that distance exceeds `tolerance`, the point is kept
/// and both halves are processed.
fn rdp(points: &[GridPoint], first: usize, last: usize, tolerance: f64, kept: &mut [bool]) {
    let mut pending = vec![(first, last)];

    while let Some((start, end)) = pending.pop() {
        if end <= start + 1 {
            continue;
        }

        let a = points[start].to_point();
        let b = points[end].to_point();
        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = perpendicular_distance(p.to_point(), a, b);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            kept[max_idx] = true;
            pending.push((max_idx, end));
            pending.push((start, max_idx));
        }
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::trace;
    use crate::types::BinaryMask;

    fn boundary(points: &[(u32, u32)]) -> Boundary {
        Boundary::new(points.iter().map(|&(x, y)| GridPoint::new(x, y)).collect())
    }

    fn traced(mask: &BinaryMask) -> Boundary {
        trace(mask).into_iter().next().unwrap_or_else(|| Boundary::new(vec![]))
    }

    #[test]
    fn short_boundaries_unchanged() {
        let empty = boundary(&[]);
        assert_eq!(simplify(&empty, 0.02), empty);
        let two = boundary(&[(0, 0), (5, 0)]);
        assert_eq!(simplify(&two, 0.02), two);
    }

    #[test]
    fn traced_square_reduces_to_corners() {
        let mask = BinaryMask::from_fn(40, 40, |x, y| {
            (5..35).contains(&x) && (8..30).contains(&y)
        });
        let simplified = simplify(&traced(&mask), 0.02);
        assert_eq!(simplified, boundary(&[(5, 8), (34, 8), (34, 29), (5, 29)]));
    }

    #[test]
    fn traced_disc_keeps_at_least_eight_vertices() {
        let mask = BinaryMask::from_fn(80, 80, |x, y| {
            let dx = f64::from(x) - 40.0;
            let dy = f64::from(y) - 40.0;
            dx.hypot(dy) <= 30.0
        });
        let simplified = simplify(&traced(&mask), 0.02);
        assert!(simplified.len() >= 8, "got {} vertices", simplified.len());
    }

    #[test]
    fn collinear_loop_collapses_to_extremes() {
        let pl = boundary(&[(0, 0), (1, 0), (2, 0), (3, 0), (2, 0), (1, 0)]);
        let result = simplify_closed(&pl, 0.1);
        assert_eq!(result, boundary(&[(0, 0), (3, 0)]));
    }

    #[test]
    fn zero_tolerance_keeps_every_corner() {
        let pl = boundary(&[(0, 0), (4, 0), (4, 1), (5, 1), (5, 4), (0, 4)]);
        assert_eq!(simplify_closed(&pl, 0.0), pl);
    }

    #[test]
    fn resimplifying_is_a_no_op() {
        let mask = BinaryMask::from_fn(60, 60, |x, y| {
            // Right triangle plus a notch.
            x >= 5 && y < 55 && x <= y && !((20..24).contains(&x) && (40..44).contains(&y))
        });
        let once = simplify(&traced(&mask), 0.02);
        let twice = simplify(&once, 0.02);
        assert_eq!(once, twice);

        let disc = BinaryMask::from_fn(70, 70, |x, y| {
            (f64::from(x) - 35.0).hypot(f64::from(y) - 35.0) <= 25.0
        });
        let once = simplify(&traced(&disc), 0.02);
        assert_eq!(simplify(&once, 0.02), once);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let mask = BinaryMask::from_fn(50, 50, |x, y| x + y > 30 && x < 45 && y < 45);
        let b = traced(&mask);
        assert_eq!(simplify(&b, 0.02), simplify(&b, 0.02));
    }

    #[test]
    fn perpendicular_distance_on_axis() {
        let d = perpendicular_distance(
            Point::new(1.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-10);
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints() {
        let d = perpendicular_distance(
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-10);
    }
}
