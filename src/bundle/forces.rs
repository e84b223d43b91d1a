use rayon::prelude::*;

use crate::geometry::Vector2;
use crate::ir::Edge;

/// Component deltas below this count as coincident points and exert no pull.
pub const COINCIDENCE_EPSILON: f64 = 1e-4;

/// Pull of interior point `i` towards the midpoint of its neighbours.
pub fn spring_force(points: &[Vector2], i: usize, k_p: f64) -> Vector2 {
    let prev = points[i - 1];
    let curr = points[i];
    let next = points[i + 1];
    Vector2::new(
        (prev.x + next.x - 2.0 * curr.x) * k_p,
        (prev.y + next.y - 2.0 * curr.y) * k_p,
    )
}

/// Unit pulls from point `i` of every compatible edge towards point `i` of
/// `edges[edge_idx]`.
pub fn electrostatic_force(edges: &[Edge], edge_idx: usize, i: usize) -> Vector2 {
    let edge = &edges[edge_idx];
    let here = edge.subdivision_points[i];
    let mut force = Vector2::ZERO;
    for &other in &edge.compatible_edges {
        let Some(&there) = edges[other].subdivision_points.get(i) else {
            continue;
        };
        let delta = there - here;
        if delta.x.abs() < COINCIDENCE_EPSILON && delta.y.abs() < COINCIDENCE_EPSILON {
            continue;
        }
        force.add_in_place(delta * (1.0 / here.distance_to(there)));
    }
    force
}

/// Per-point displacement of one edge for a single iteration. Endpoints get
/// zero.
///
/// `edge_length` is the guarded straight from→to length of the edge.
pub fn edge_displacements(
    edges: &[Edge],
    edge_idx: usize,
    edge_length: f64,
    stiffness: f64,
    step_size: f64,
) -> Vec<Vector2> {
    let points = &edges[edge_idx].subdivision_points;
    let mut out = vec![Vector2::ZERO; points.len()];
    if points.len() < 3 {
        return out;
    }
    let interior = points.len() - 2;
    let k_p = stiffness / (edge_length * (interior + 1) as f64);
    for i in 1..=interior {
        let total = spring_force(points, i, k_p) + electrostatic_force(edges, edge_idx, i);
        out[i] = total * step_size;
    }
    out
}

/// Evaluation pass: every displacement is computed from the same snapshot.
pub fn compute_displacements(
    edges: &[Edge],
    edge_lengths: &[f64],
    stiffness: f64,
    step_size: f64,
) -> Vec<Vec<Vector2>> {
    (0..edges.len())
        .into_par_iter()
        .map(|idx| edge_displacements(edges, idx, edge_lengths[idx], stiffness, step_size))
        .collect()
}

/// Application pass. Each edge only touches its own interior points.
pub fn apply_displacements(edges: &mut [Edge], displacements: &[Vec<Vector2>]) {
    edges
        .par_iter_mut()
        .zip(displacements.par_iter())
        .for_each(|(edge, deltas)| {
            let last = edge.subdivision_points.len().saturating_sub(1);
            for (i, point) in edge.subdivision_points.iter_mut().enumerate() {
                if i == 0 || i == last {
                    continue;
                }
                if let Some(delta) = deltas.get(i) {
                    point.add_in_place(*delta);
                }
            }
        });
}

/// One full iteration: evaluate everything, then move everything.
pub fn iterate(edges: &mut [Edge], edge_lengths: &[f64], stiffness: f64, step_size: f64) {
    let displacements = compute_displacements(edges, edge_lengths, stiffness, step_size);
    apply_displacements(edges, &displacements);
}
