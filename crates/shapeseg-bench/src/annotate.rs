//! Overlay rendering: draw each region's boundary, bounding box and
//! centroid on a copy of the input image.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use shapeseg_pipeline::{Boundary, Region};

const BOUNDARY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CENTROID_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTROID_RADIUS: i32 = 3;

/// Copy `base` and draw every region onto it.
pub fn annotate(base: &RgbImage, regions: &[Region]) -> RgbImage {
    let mut canvas = base.clone();
    for region in regions {
        draw_boundary(&mut canvas, &region.boundary);
        draw_box(&mut canvas, region);
        draw_centroid(&mut canvas, region);
    }
    canvas
}

#[allow(clippy::cast_precision_loss)]
fn draw_boundary(canvas: &mut RgbImage, boundary: &Boundary) {
    for (a, b) in boundary.edges() {
        draw_line_segment_mut(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            BOUNDARY_COLOR,
        );
    }
}

#[allow(clippy::cast_possible_wrap)]
fn draw_box(canvas: &mut RgbImage, region: &Region) {
    let bb = region.bounding_box;
    if bb.width == 0 || bb.height == 0 {
        return;
    }
    let rect = Rect::at(bb.x as i32, bb.y as i32).of_size(bb.width, bb.height);
    draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
}

#[allow(clippy::cast_possible_truncation)]
fn draw_centroid(canvas: &mut RgbImage, region: &Region) {
    let center = (
        region.centroid.x.round() as i32,
        region.centroid.y.round() as i32,
    );
    draw_filled_circle_mut(canvas, center, CENTROID_RADIUS, CENTROID_COLOR);
}
