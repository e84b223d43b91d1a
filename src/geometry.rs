use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Lengths and coordinate deltas below this are treated as zero.
pub const EPSILON: f64 = 1e-6;

/// 2D point or displacement in canvas units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add_in_place(&mut self, delta: Vector2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Vector2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Vector2) -> Vector2 {
        Vector2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    pub fn lerp(self, other: Vector2, t: f64) -> Vector2 {
        Vector2::new(
            self.x + t * (other.x - self.x),
            self.y + t * (other.y - self.y),
        )
    }

    /// Orthogonal projection of `self` onto the infinite line through `a` and `b`.
    ///
    /// Solves for the `r` minimising the distance to `a + r·(b - a)`. A
    /// degenerate line collapses every projection onto `a`.
    pub fn project_onto_line(self, a: Vector2, b: Vector2) -> Vector2 {
        let dir = b - a;
        let len_sq = dir.dot(dir);
        if len_sq < EPSILON * EPSILON {
            return a;
        }
        let r = (self - a).dot(dir) / len_sq;
        a + dir * r
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// Straight line between an edge's endpoints, before any bending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vector2,
    pub to: Vector2,
}

impl Segment {
    pub fn new(from: Vector2, to: Vector2) -> Self {
        Self { from, to }
    }

    pub fn vector(&self) -> Vector2 {
        self.to - self.from
    }

    /// Euclidean length, with near-zero lengths replaced by [`EPSILON`] so it
    /// can be used as a divisor.
    pub fn length(&self) -> f64 {
        let delta = self.vector();
        if delta.x.abs() < EPSILON && delta.y.abs() < EPSILON {
            EPSILON
        } else {
            delta.length()
        }
    }

    pub fn midpoint(&self) -> Vector2 {
        self.from.midpoint(self.to)
    }
}

/// Sum of consecutive segment lengths.
pub fn polyline_length(points: &[Vector2]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_uses_both_axes() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(4.0, 6.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn add_in_place_accumulates() {
        let mut p = Vector2::new(1.0, 1.0);
        p.add_in_place(Vector2::new(0.5, -2.0));
        assert_eq!(p, Vector2::new(1.5, -1.0));
    }

    #[test]
    fn projection_drops_perpendicular() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(10.0, 0.0);
        let p = Vector2::new(3.0, 7.0).project_onto_line(a, b);
        assert!((p.x - 3.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);

        // beyond the segment still lands on the infinite line
        let q = Vector2::new(-4.0, -1.0).project_onto_line(a, b);
        assert!((q.x + 4.0).abs() < 1e-12);
    }

    #[test]
    fn projection_on_degenerate_line_is_anchor() {
        let a = Vector2::new(2.0, 2.0);
        let p = Vector2::new(9.0, 9.0).project_onto_line(a, a);
        assert_eq!(p, a);
    }

    #[test]
    fn degenerate_segment_length_is_epsilon() {
        let p = Vector2::new(5.0, 5.0);
        assert_eq!(Segment::new(p, p).length(), EPSILON);
        let s = Segment::new(Vector2::new(0.0, 0.0), Vector2::new(0.0, 2.0));
        assert_eq!(s.length(), 2.0);
    }

    #[test]
    fn polyline_length_sums_segments() {
        let pts = [
            Vector2::new(0.0, 0.0),
            Vector2::new(3.0, 4.0),
            Vector2::new(3.0, 10.0),
        ];
        assert!((polyline_length(&pts) - 11.0).abs() < 1e-12);
        assert_eq!(polyline_length(&pts[..1]), 0.0);
    }
}
