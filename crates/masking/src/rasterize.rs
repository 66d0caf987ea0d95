//! Polygon rasterization: filled masks and overlay outlines.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use tracing::debug;

use crate::annotations::Polygon;
use crate::mask::{Mask, ON};

/// Outline color for annotated regions on the overlay map.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline stroke width in pixels.
pub const OUTLINE_WIDTH: i32 = 3;

/// Fill every polygon interior into a binary mask of the given dimensions.
///
/// Fill rule is the scanline even-odd rule, applied identically every run;
/// polygons need not be convex and self-intersecting ones fill
/// deterministically. Degenerate polygons (fewer than three distinct
/// vertices) contribute nothing.
pub fn rasterize_polygons(dimensions: (u32, u32), polygons: &[Polygon]) -> Mask {
    let mut canvas = GrayImage::new(dimensions.0, dimensions.1);
    let mut skipped = 0usize;
    for polygon in polygons {
        match polygon.fill_points() {
            Some(points) => draw_polygon_mut(&mut canvas, &points, Luma([ON])),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} degenerate polygon(s)");
    }
    Mask::from_gray(canvas)
}

/// Clone the thumbnail and draw each polygon's closed boundary onto the
/// clone as a fixed-width outline. The input thumbnail is never touched, so
/// it can be reused for tissue segmentation afterwards.
pub fn draw_outlines(thumbnail: &RgbImage, polygons: &[Polygon]) -> RgbImage {
    let mut overlay = thumbnail.clone();
    for polygon in polygons {
        if polygon.points().len() < 2 {
            continue;
        }
        for (from, to) in polygon.closed_segments() {
            draw_thick_segment(&mut overlay, from, to, OUTLINE_COLOR);
        }
    }
    overlay
}

/// Approximate a stroke of [`OUTLINE_WIDTH`] by offsetting the segment
/// perpendicular to its dominant axis.
fn draw_thick_segment(canvas: &mut RgbImage, from: Point<i32>, to: Point<i32>, color: Rgb<u8>) {
    let steep = (to.y - from.y).abs() > (to.x - from.x).abs();
    for offset in -(OUTLINE_WIDTH / 2)..=OUTLINE_WIDTH / 2 {
        let (dx, dy) = if steep { (offset, 0) } else { (0, offset) };
        draw_line_segment_mut(
            canvas,
            ((from.x + dx) as f32, (from.y + dy) as f32),
            ((to.x + dx) as f32, (to.y + dy) as f32),
            color,
        );
    }
}
