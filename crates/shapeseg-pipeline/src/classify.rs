//! Shape classification from the simplified vertex count.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape category of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeLabel {
    /// Three vertices.
    Triangle,
    /// Four vertices: squares, rectangles and other quadrilaterals.
    Quadrilateral,
    /// Any other vertex count up to eight, carrying the count. Degenerate
    /// counts below three also land here.
    Polygon(usize),
    /// More than eight vertices.
    CircleOrEllipse,
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triangle => f.write_str("Triangle"),
            Self::Quadrilateral => f.write_str("Quadrilateral"),
            Self::Polygon(n) => write!(f, "Polygon ({n} sides)"),
            Self::CircleOrEllipse => f.write_str("Circle/Ellipse"),
        }
    }
}

/// Map a simplified vertex count to its shape label.
#[must_use]
pub const fn classify(vertex_count: usize) -> ShapeLabel {
    match vertex_count {
        3 => ShapeLabel::Triangle,
        4 => ShapeLabel::Quadrilateral,
        n if n > 8 => ShapeLabel::CircleOrEllipse,
        n => ShapeLabel::Polygon(n),
    }
}
