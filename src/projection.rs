use serde::{Deserialize, Serialize};

use crate::geometry::{EPSILON, Vector2};

/// Earth radius in thousands of kilometres. Only ratios matter here.
pub const EARTH_RADIUS: f64 = 6.371;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned drawing area in canvas units, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasRect {
    pub top_left: Vector2,
    pub bottom_right: Vector2,
}

impl CanvasRect {
    pub fn new(top_left: Vector2, bottom_right: Vector2) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Rectangle inset by `padding` on every side of a `width`×`height` canvas.
    pub fn padded(width: f64, height: f64, padding: f64) -> Self {
        Self::new(
            Vector2::new(padding, padding),
            Vector2::new(width - padding, height - padding),
        )
    }
}

impl Default for CanvasRect {
    fn default() -> Self {
        Self::new(Vector2::new(100.0, 50.0), Vector2::new(1500.0, 610.0))
    }
}

/// Equirectangular projection of a geographic bounding box onto a canvas
/// rectangle. North-west maps to the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasProjection {
    canvas: CanvasRect,
    mean_lat: f64,
    global_top_left: Vector2,
    global_bottom_right: Vector2,
}

impl CanvasProjection {
    pub fn new(canvas: CanvasRect, north_west: LatLng, south_east: LatLng) -> Self {
        let mean_lat = ((north_west.lat + south_east.lat) / 2.0).to_radians();
        let mut projection = Self {
            canvas,
            mean_lat,
            global_top_left: Vector2::ZERO,
            global_bottom_right: Vector2::ZERO,
        };
        projection.global_top_left = projection.to_global(north_west);
        projection.global_bottom_right = projection.to_global(south_east);
        projection
    }

    /// Projection whose box is the bounding box of `coords`. `None` when
    /// `coords` is empty.
    pub fn fit(canvas: CanvasRect, coords: &[LatLng]) -> Option<Self> {
        let first = coords.first()?;
        let (mut min_lat, mut max_lat) = (first.lat, first.lat);
        let (mut min_lng, mut max_lng) = (first.lng, first.lng);
        for c in coords {
            min_lat = min_lat.min(c.lat);
            max_lat = max_lat.max(c.lat);
            min_lng = min_lng.min(c.lng);
            max_lng = max_lng.max(c.lng);
        }
        Some(Self::new(
            canvas,
            LatLng::new(max_lat, min_lng),
            LatLng::new(min_lat, max_lng),
        ))
    }

    fn to_global(&self, coord: LatLng) -> Vector2 {
        Vector2::new(
            EARTH_RADIUS * coord.lng * self.mean_lat.cos(),
            EARTH_RADIUS * coord.lat,
        )
    }

    pub fn project(&self, coord: LatLng) -> Vector2 {
        let global = self.to_global(coord);
        let tl = self.canvas.top_left;
        let br = self.canvas.bottom_right;
        let fx = fraction(global.x, self.global_top_left.x, self.global_bottom_right.x);
        let fy = fraction(global.y, self.global_top_left.y, self.global_bottom_right.y);
        Vector2::new(tl.x + (br.x - tl.x) * fx, tl.y + (br.y - tl.y) * fy)
    }
}

// A flat box (all points on one meridian or parallel) centres on that axis.
fn fraction(value: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span.abs() < EPSILON {
        0.5
    } else {
        (value - start) / span
    }
}
