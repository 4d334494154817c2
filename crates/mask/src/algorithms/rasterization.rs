use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;

use crate::{
    traits::PolygonRasterizer,
    types::{CanvasSize, Point},
};

pub const FOREGROUND: Luma<u8> = Luma([255u8]);

/// Even-odd scanline fill plus an explicit outline pass.
///
/// The fill samples integer pixel coordinates with a half-open edge rule so
/// shared vertices are not counted twice; the outline pass then sets every
/// pixel on the polygon boundary, including the closing edge.
#[derive(Debug, Clone, Default)]
pub struct ScanlineRasterizer;

impl PolygonRasterizer for ScanlineRasterizer {
    fn rasterize(&self, (width, height): CanvasSize, points: &[Point]) -> GrayImage {
        let mut canvas = GrayImage::new(width, height);
        let vertices: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();

        fill_polygon_mut(&mut canvas, &vertices, FOREGROUND);
        draw_outline_mut(&mut canvas, &vertices, FOREGROUND);
        canvas
    }
}

/// Fill the interior of a polygon. Fewer than three vertices fill nothing.
///
/// Only scanlines inside the canvas are visited, so far-away vertices cost
/// nothing beyond their edge intersections.
pub fn fill_polygon_mut(canvas: &mut GrayImage, vertices: &[(f64, f64)], color: Luma<u8>) {
    let (width, height) = canvas.dimensions();
    if vertices.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let y_low = vertices.iter().map(|v| v.1).fold(f64::INFINITY, f64::min);
    let y_high = vertices.iter().map(|v| v.1).fold(f64::NEG_INFINITY, f64::max);
    if !y_low.is_finite() || !y_high.is_finite() {
        return;
    }
    let y_start = y_low.ceil().max(0.0) as u32;
    let y_end = y_high.floor().min(f64::from(height - 1));
    if y_end < 0.0 {
        return;
    }
    let y_end = y_end as u32;

    let max_x = f64::from(width - 1);
    let mut crossings: Vec<f64> = Vec::with_capacity(vertices.len());

    for y in y_start..=y_end {
        let yf = f64::from(y);
        crossings.clear();

        for (i, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            if (y0 <= yf && yf < y1) || (y1 <= yf && yf < y0) {
                crossings.push(x0 + (yf - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let from = span[0].ceil().max(0.0);
            let to = span[1].floor().min(max_x);
            if from > to {
                continue;
            }
            for x in from as u32..=to as u32 {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

/// Draw every edge of the implicitly closed ring.
///
/// Edges are clipped to the canvas grown by one pixel before they are
/// handed to the line drawer, which otherwise steps through every
/// off-canvas pixel of the segment.
pub fn draw_outline_mut(canvas: &mut GrayImage, vertices: &[(f64, f64)], color: Luma<u8>) {
    let (width, height) = canvas.dimensions();
    let bounds = (-1.0, -1.0, f64::from(width), f64::from(height));

    for (i, &start) in vertices.iter().enumerate() {
        let end = vertices[(i + 1) % vertices.len()];
        if !(start.0.is_finite() && start.1.is_finite() && end.0.is_finite() && end.1.is_finite()) {
            continue;
        }
        if let Some((from, to)) = clip_segment(start, end, bounds) {
            draw_line_segment_mut(
                canvas,
                (from.0 as f32, from.1 as f32),
                (to.0 as f32, to.1 as f32),
                color,
            );
        }
    }
}

type Segment = ((f64, f64), (f64, f64));

/// Liang-Barsky clip of `start -> end` against `(x_min, y_min, x_max, y_max)`.
/// `None` when the segment lies entirely outside.
fn clip_segment(
    start: (f64, f64),
    end: (f64, f64),
    bounds: (f64, f64, f64, f64),
) -> Option<Segment> {
    let (x_min, y_min, x_max, y_max) = bounds;
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let (mut t_enter, mut t_exit) = (0.0f64, 1.0f64);

    let edges = [
        (-dx, start.0 - x_min),
        (dx, x_max - start.0),
        (-dy, start.1 - y_min),
        (dy, y_max - start.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t_exit {
                return None;
            }
            t_enter = t_enter.max(t);
        } else {
            if t < t_enter {
                return None;
            }
            t_exit = t_exit.min(t);
        }
    }

    let at = |t: f64| (start.0 + t * dx, start.1 + t * dy);
    Some((at(t_enter), at(t_exit)))
}
