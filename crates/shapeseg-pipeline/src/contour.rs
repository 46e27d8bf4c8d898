//! Boundary tracing: extract the outer border of every foreground region.
//!
//! Connected regions use 8-connectivity. Each region is discovered by a
//! row-major scan, flood-filled with an explicit work-list so that large
//! regions cannot exhaust the call stack, and its outer border is then
//! followed clockwise with Moore-neighbour tracing.
//!
//! Only outer borders are produced. Holes are ignored, and so are regions
//! sitting inside another region's hole: a region counts as outer when the
//! background pixel left of its first raster pixel is 4-connected to the
//! image frame.

use image::GrayImage;

use crate::types::{BinaryMask, Boundary, GridPoint};

/// Neighbour offsets in clockwise order (y grows downward), starting east.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const WEST: usize = 4;

/// 4-connected offsets for background flooding.
const AXIS_DIRECTIONS: [usize; 4] = [0, 2, 4, 6];

/// Trace the outer boundary of every non-nested foreground region.
///
/// Boundaries are returned in the order their first pixel appears in a
/// row-major scan. Every boundary starts at that pixel, runs clockwise,
/// and ends at a pixel 8-adjacent to the start. An isolated pixel yields
/// a one-point boundary.
#[must_use = "returns the traced boundaries"]
pub fn trace(mask: &BinaryMask) -> Vec<Boundary> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let exterior = exterior_background(mask);
    let mut visited = vec![false; width * height];
    let mut work = Vec::new();
    let mut boundaries = Vec::new();
    let mut nested = 0usize;

    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let idx = y as usize * width + x as usize;
            if visited[idx] || !mask.is_foreground(x, y) {
                continue;
            }

            let seed = GridPoint::new(x, y);
            let size = flood_component(mask, seed, &mut visited, &mut work);

            let outer = x == 0 || exterior[idx - 1];
            if !outer {
                nested += 1;
                continue;
            }
            boundaries.push(follow_border(mask, seed, size));
        }
    }

    tracing::debug!(
        boundaries = boundaries.len(),
        nested,
        "traced region boundaries"
    );
    boundaries
}

/// Trace boundaries from a plain grayscale raster, treating any non-zero
/// pixel as foreground.
#[must_use = "returns the traced boundaries"]
pub fn trace_image(image: &GrayImage) -> Vec<Boundary> {
    trace(&BinaryMask::from_image(image))
}

/// The pixel one step from `p` in direction `dir`, if it lies inside the
/// mask.
fn neighbour(mask: &BinaryMask, p: GridPoint, dir: usize) -> Option<GridPoint> {
    let (dx, dy) = DIRECTIONS[dir];
    let x = p.x.checked_add_signed(dx)?;
    let y = p.y.checked_add_signed(dy)?;
    (x < mask.width() && y < mask.height()).then_some(GridPoint::new(x, y))
}

/// Search the neighbours of `p` clockwise, starting just after direction
/// `from`, for the first foreground pixel.
fn probe(mask: &BinaryMask, p: GridPoint, from: usize) -> Option<(usize, GridPoint)> {
    (1..=8).map(|k| (from + k) % 8).find_map(|dir| {
        neighbour(mask, p, dir)
            .filter(|q| mask.is_foreground(q.x, q.y))
            .map(|q| (dir, q))
    })
}

/// Direction from the pixel just entered (via `dir`) back to the last
/// background pixel examined before it.
const fn backtrack(dir: usize) -> usize {
    if dir % 2 == 0 {
        (dir + 6) % 8
    } else {
        (dir + 5) % 8
    }
}

/// Moore-neighbour border following from `start`, the first raster pixel
/// of its region (so its west, north-west, north and north-east
/// neighbours are background).
///
/// Stops when the walk is back at `start` and about to repeat its first
/// move.
fn follow_border(mask: &BinaryMask, start: GridPoint, region_size: usize) -> Boundary {
    let Some((first_dir, first)) = probe(mask, start, WEST) else {
        return Boundary::new(vec![start]);
    };

    let mut points = vec![start];
    let mut current = first;
    let mut dir = first_dir;
    let max_steps = region_size.saturating_mul(8).saturating_add(8);

    for _ in 0..max_steps {
        let Some((next_dir, next)) = probe(mask, current, backtrack(dir)) else {
            break;
        };
        if current == start && next_dir == first_dir {
            return Boundary::new(points);
        }
        points.push(current);
        current = next;
        dir = next_dir;
    }

    tracing::warn!(
        x = start.x,
        y = start.y,
        points = points.len(),
        "border following did not close"
    );
    Boundary::new(points)
}

/// Mark every pixel of the 8-connected region containing `seed` as
/// visited. Returns the region's pixel count.
fn flood_component(
    mask: &BinaryMask,
    seed: GridPoint,
    visited: &mut [bool],
    work: &mut Vec<GridPoint>,
) -> usize {
    let width = mask.width() as usize;
    let index = |p: GridPoint| p.y as usize * width + p.x as usize;

    work.clear();
    work.push(seed);
    visited[index(seed)] = true;
    let mut size = 0;

    while let Some(p) = work.pop() {
        size += 1;
        for dir in 0..DIRECTIONS.len() {
            if let Some(q) = neighbour(mask, p, dir)
                && mask.is_foreground(q.x, q.y)
                && !visited[index(q)]
            {
                visited[index(q)] = true;
                work.push(q);
            }
        }
    }
    size
}

/// Background pixels 4-connected to the image frame, row-major.
fn exterior_background(mask: &BinaryMask) -> Vec<bool> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let index = |p: GridPoint| p.y as usize * width + p.x as usize;

    let mut exterior = vec![false; width * height];
    let mut work: Vec<GridPoint> = Vec::new();

    let frame = (0..mask.width())
        .flat_map(|x| [GridPoint::new(x, 0), GridPoint::new(x, mask.height() - 1)])
        .chain(
            (0..mask.height())
                .flat_map(|y| [GridPoint::new(0, y), GridPoint::new(mask.width() - 1, y)]),
        );
    for p in frame {
        if !mask.is_foreground(p.x, p.y) && !exterior[index(p)] {
            exterior[index(p)] = true;
            work.push(p);
        }
    }

    while let Some(p) = work.pop() {
        for dir in AXIS_DIRECTIONS {
            if let Some(q) = neighbour(mask, p, dir)
                && !mask.is_foreground(q.x, q.y)
                && !exterior[index(q)]
            {
                exterior[index(q)] = true;
                work.push(q);
            }
        }
    }
    exterior
}
