use rayon::prelude::*;

use crate::geometry::{EPSILON, Vector2, polyline_length};
use crate::ir::Edge;

/// Resamples a polyline to `count` interior points spaced evenly by arc
/// length. The first and last input points are kept as-is.
///
/// `count == 1` always yields the straight-line midpoint, regardless of how
/// the polyline is bent. A polyline too short to carry `count` distinct
/// points is spread along the straight line instead.
pub fn resample(points: &[Vector2], count: usize) -> Vec<Vector2> {
    let (Some(&from), Some(&to)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if count == 0 {
        return vec![from, to];
    }
    if count == 1 {
        return vec![from, from.midpoint(to), to];
    }

    let step = polyline_length(points) / (count + 1) as f64;
    let mut out = Vec::with_capacity(count + 2);
    out.push(from);

    if step < EPSILON {
        for k in 1..=count {
            out.push(from.lerp(to, k as f64 / (count + 1) as f64));
        }
        out.push(to);
        return out;
    }

    let mut budget = step;
    'walk: for pair in points.windows(2) {
        let mut cursor = pair[0];
        let end = pair[1];
        let mut remaining = cursor.distance_to(end);
        while remaining > budget {
            if out.len() == count + 1 {
                break 'walk;
            }
            cursor = cursor.lerp(end, budget / remaining);
            out.push(cursor);
            remaining -= budget;
            budget = step;
        }
        budget -= remaining;
    }

    // Rounding can leave the last emission sitting exactly on `to`.
    while out.len() < count + 1 {
        out.push(to);
    }
    out.push(to);
    out
}

/// Rebuilds one edge's polyline at `count` interior points.
pub fn subdivide_edge(edge: &mut Edge, count: usize) {
    edge.subdivision_points = resample(&edge.subdivision_points, count);
}

pub fn subdivide_all(edges: &mut [Edge], count: usize) {
    edges
        .par_iter_mut()
        .for_each(|edge| subdivide_edge(edge, count));
}
