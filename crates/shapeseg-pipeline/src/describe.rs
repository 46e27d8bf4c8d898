//! Geometric descriptors of a traced region.
//!
//! Area and centroid come from the polygon moments of the boundary
//! (shoelace sums over its closing edges), so they describe the polygon
//! through the boundary pixel centers rather than a pixel count. A
//! `w x h` pixel block therefore has area `(w - 1) * (h - 1)`.

use crate::classify::classify;
use crate::types::{Boundary, BoundingBox, Point, Region};

/// Zeroth and first order moments of a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Signed area; positive for clockwise boundaries in image coordinates.
    pub m00: f64,
    /// First moment about the y axis.
    pub m10: f64,
    /// First moment about the x axis.
    pub m01: f64,
}

impl Moments {
    /// Accumulate the polygon moments over the closing edges of `boundary`.
    #[must_use]
    pub fn of(boundary: &Boundary) -> Self {
        let mut twice_area = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;

        for (a, b) in boundary.edges() {
            let (a, b) = (a.to_point(), b.to_point());
            let cross = a.x.mul_add(b.y, -(b.x * a.y));
            twice_area += cross;
            m10 += (a.x + b.x) * cross;
            m01 += (a.y + b.y) * cross;
        }

        Self {
            m00: twice_area / 2.0,
            m10: m10 / 6.0,
            m01: m01 / 6.0,
        }
    }

    /// `(m10 / m00, m01 / m00)`, or `None` for a zero-area polygon.
    #[must_use]
    pub fn centroid(&self) -> Option<Point> {
        (self.m00 != 0.0).then(|| Point::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Enclosed area by the shoelace formula.
#[must_use]
pub fn shoelace_area(boundary: &Boundary) -> f64 {
    Moments::of(boundary).m00.abs()
}

/// Closed arc length: the sum of edge lengths including the edge from the
/// last point back to the first.
#[must_use]
pub fn perimeter(boundary: &Boundary) -> f64 {
    if boundary.len() < 2 {
        return 0.0;
    }
    boundary
        .edges()
        .map(|(a, b)| a.to_point().distance(b.to_point()))
        .sum()
}

/// Extent of the boundary points. An empty boundary has an empty box at
/// the origin.
#[must_use]
pub fn bounding_box(boundary: &Boundary) -> BoundingBox {
    let mut points = boundary.points().iter();
    let Some(first) = points.next() else {
        return BoundingBox {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    };

    let (min_x, min_y, max_x, max_y) = points.fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    );
    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

/// Build a [`Region`] from a traced boundary and its simplified form.
///
/// Area, perimeter, centroid and bounding box use the original boundary;
/// the vertex count and shape label use the simplified one. A zero-area
/// boundary gets the centroid `(0, 0)`.
#[must_use]
pub fn describe(boundary: Boundary, simplified: Boundary) -> Region {
    let moments = Moments::of(&boundary);
    let centroid = moments.centroid().unwrap_or_else(|| {
        tracing::debug!(
            points = boundary.len(),
            "degenerate region has zero area, centroid defaults to origin"
        );
        Point::new(0.0, 0.0)
    });
    let vertex_count = simplified.len();

    Region {
        area: moments.m00.abs(),
        perimeter: perimeter(&boundary),
        centroid,
        bounding_box: bounding_box(&boundary),
        vertex_count,
        shape: classify(vertex_count),
        boundary,
        simplified,
    }
}
