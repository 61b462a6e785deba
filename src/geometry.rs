//! Polygon and landmark-ring helpers shared by the region samplers.
//!
//! Everything here is a pure function over [`Point`]s. Degenerate input
//! (too few vertices, empty rings) yields `false`, `None`, or an empty
//! polygon rather than a panic.

use crate::types::Point;

/// Inclusive pixel rectangle, already clamped to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1).max(0) as u32
    }
}

/// Even-odd ray casting containment test.
///
/// Polygons with fewer than 3 vertices contain nothing. Points on an edge
/// resolve deterministically: the left and top edges are inside, the right
/// and bottom edges are outside.
pub fn point_in_polygon(x: f32, y: f32, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > y) != (pj.y > y) && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Integer bounds of a polygon, clamped to a `width` x `height` image.
///
/// Returns `None` for an empty polygon or when the polygon lies entirely
/// outside the image.
pub fn polygon_bounds(polygon: &[Point], width: u32, height: u32) -> Option<PixelRect> {
    if polygon.is_empty() || width == 0 || height == 0 {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in polygon {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let rect = PixelRect {
        min_x: (min_x.floor() as i32).max(0),
        min_y: (min_y.floor() as i32).max(0),
        max_x: (max_x.ceil() as i32).min(width as i32 - 1),
        max_y: (max_y.ceil() as i32).min(height as i32 - 1),
    };
    (rect.min_x <= rect.max_x && rect.min_y <= rect.max_y).then_some(rect)
}

/// Mean distance from `points[0]` (the ring centre) to every other point.
///
/// Returns `None` when the ring has no points besides its centre.
pub fn estimate_ring_radius(points: &[Point]) -> Option<f32> {
    let (center, ring) = points.split_first()?;
    if ring.is_empty() {
        return None;
    }
    let total: f32 = ring.iter().map(|p| p.distance(center)).sum();
    Some(total / ring.len() as f32)
}

/// Arithmetic mean of the vertices.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Point::zero(), |acc, p| acc + *p);
    Some(sum * (1.0 / points.len() as f32))
}

/// Scale a polygon about its centroid (`factor < 1` shrinks it inward).
pub fn scale_about_centroid(polygon: &[Point], factor: f32) -> Vec<Point> {
    let Some(center) = centroid(polygon) else {
        return Vec::new();
    };
    polygon
        .iter()
        .map(|p| center + (*p - center) * factor)
        .collect()
}

/// Approximate an axis-aligned ellipse with a vertex every `step_degrees`.
pub fn ellipse_polygon(center: Point, radius_x: f32, radius_y: f32, step_degrees: usize) -> Vec<Point> {
    (0..360)
        .step_by(step_degrees.max(1))
        .map(|angle| {
            let rad = (angle as f32).to_radians();
            Point::new(
                center.x + radius_x * rad.cos(),
                center.y + radius_y * rad.sin(),
            )
        })
        .collect()
}

/// Closed contour from an upper and a lower lid line: the upper line in
/// order, then the lower line reversed.
pub fn closed_contour(upper: &[Point], lower: &[Point]) -> Vec<Point> {
    upper.iter().chain(lower.iter().rev()).copied().collect()
}
