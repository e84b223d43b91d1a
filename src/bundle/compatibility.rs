use rayon::prelude::*;

use crate::geometry::{EPSILON, Segment};

/// 1 for parallel or anti-parallel edges, 0 for perpendicular ones.
pub fn angle_compatibility(p: &Segment, q: &Segment) -> f64 {
    let score = p.vector().dot(q.vector()).abs() / (p.length() * q.length());
    score.min(1.0)
}

/// Penalises edges of very different length.
pub fn scale_compatibility(p: &Segment, q: &Segment) -> f64 {
    let (lp, lq) = (p.length(), q.length());
    let avg = (lp + lq) / 2.0;
    2.0 / (avg / lp.min(lq) + lp.max(lq) / avg)
}

/// Penalises midpoints far apart relative to the average edge length.
pub fn position_compatibility(p: &Segment, q: &Segment) -> f64 {
    let avg = (p.length() + q.length()) / 2.0;
    avg / (avg + p.midpoint().distance_to(q.midpoint()))
}

/// How much of `q` is seen from `p`: `q` is dropped onto the infinite line
/// through `p` and the offset of the projected midpoint from `p`'s midpoint
/// is compared with the projected span.
pub fn visibility(p: &Segment, q: &Segment) -> f64 {
    let i0 = q.from.project_onto_line(p.from, p.to);
    let i1 = q.to.project_onto_line(p.from, p.to);
    let span = i0.distance_to(i1);
    if span < EPSILON {
        return 0.0;
    }
    let offset = i0.midpoint(i1).distance_to(p.midpoint());
    (1.0 - 2.0 * offset / span).max(0.0)
}

/// Visibility must hold both ways.
pub fn visibility_compatibility(p: &Segment, q: &Segment) -> f64 {
    visibility(p, q).min(visibility(q, p))
}

pub fn compatibility_score(p: &Segment, q: &Segment) -> f64 {
    angle_compatibility(p, q)
        * scale_compatibility(p, q)
        * position_compatibility(p, q)
        * visibility_compatibility(p, q)
}

pub fn is_compatible(p: &Segment, q: &Segment, threshold: f64) -> bool {
    compatibility_score(p, q) >= threshold
}

/// Symmetric compatibility lists, one per edge, each sorted ascending.
///
/// Every unordered pair is scored once; an edge is never compared with
/// itself. Rows are scored in parallel, the adjacency is assembled in index
/// order so the result does not depend on scheduling.
pub fn compute_compatibility(segments: &[Segment], threshold: f64) -> Vec<Vec<usize>> {
    let n = segments.len();
    let rows: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .filter(|&j| is_compatible(&segments[i], &segments[j], threshold))
                .collect()
        })
        .collect();

    let mut adjacency = vec![Vec::new(); n];
    for (i, row) in rows.into_iter().enumerate() {
        for j in row {
            adjacency[i].push(j);
            adjacency[j].push(i);
        }
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;
    use proptest::prelude::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Vector2::new(x0, y0), Vector2::new(x1, y1))
    }

    #[test]
    fn identical_edges_score_one() {
        let p = seg(0.0, 0.0, 10.0, 0.0);
        let q = seg(0.0, 0.0, 10.0, 0.0);
        assert!((compatibility_score(&p, &q) - 1.0).abs() < 1e-9);
        assert!(is_compatible(&p, &q, 0.6));
    }

    #[test]
    fn reversed_direction_is_still_parallel() {
        let p = seg(0.0, 0.0, 10.0, 0.0);
        let q = seg(10.0, 0.0, 0.0, 0.0);
        assert!((angle_compatibility(&p, &q) - 1.0).abs() < 1e-12);
        assert!((compatibility_score(&p, &q) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn perpendicular_edges_never_compatible() {
        let p = seg(-5.0, 0.0, 5.0, 0.0);
        let q = seg(0.0, -5.0, 0.0, 5.0);
        assert!(angle_compatibility(&p, &q).abs() < 1e-12);
        assert!(compatibility_score(&p, &q).abs() < 1e-12);
        assert!(!is_compatible(&p, &q, 0.01));
    }

    #[test]
    fn scale_penalises_length_mismatch() {
        let p = seg(0.0, 0.0, 10.0, 0.0);
        let q = seg(0.0, 1.0, 40.0, 1.0);
        let s = scale_compatibility(&p, &q);
        assert!(s > 0.0 && s < 0.8);
        assert!((scale_compatibility(&p, &p) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn position_falls_off_with_distance() {
        let p = seg(0.0, 0.0, 10.0, 0.0);
        let near = seg(0.0, 2.0, 10.0, 2.0);
        let far = seg(0.0, 50.0, 10.0, 50.0);
        assert!(position_compatibility(&p, &near) > position_compatibility(&p, &far));
        assert!((position_compatibility(&p, &near) - 10.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn visibility_drops_to_zero_for_offset_edges() {
        let p = seg(0.0, 0.0, 10.0, 0.0);
        let beside = seg(20.0, 1.0, 30.0, 1.0);
        assert_eq!(visibility(&p, &beside), 0.0);
        let overlapping = seg(2.0, 1.0, 12.0, 1.0);
        let v = visibility(&p, &overlapping);
        assert!((v - 0.6).abs() < 1e-12);
    }

    #[test]
    fn degenerate_edge_scores_without_nan() {
        let p = seg(3.0, 3.0, 3.0, 3.0);
        let q = seg(0.0, 0.0, 10.0, 0.0);
        let score = compatibility_score(&p, &q);
        assert!(score.is_finite());
        assert!(score >= 0.0);
        let score = compatibility_score(&p, &p);
        assert!(score.is_finite());
    }

    #[test]
    fn adjacency_skips_self_and_is_sorted() {
        let segments = vec![
            seg(0.0, 0.0, 10.0, 0.0),
            seg(0.0, 1.0, 10.0, 1.0),
            seg(0.0, -5.0, 0.0, 5.0),
            seg(0.0, 2.0, 10.0, 2.0),
        ];
        let adjacency = compute_compatibility(&segments, 0.6);
        assert_eq!(adjacency[0], vec![1, 3]);
        assert_eq!(adjacency[1], vec![0, 3]);
        assert!(adjacency[2].is_empty());
        assert_eq!(adjacency[3], vec![0, 1]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let p = seg(0.0, 0.0, 10.0, 0.0);
        let q = seg(1.0, 3.0, 12.0, 4.0);
        let score = compatibility_score(&p, &q);
        assert!(score > 0.0 && score < 1.0);
        assert!(is_compatible(&p, &q, score));
        assert!(!is_compatible(&p, &q, score + 1e-9));
        assert_eq!(compute_compatibility(&[p, q], score), vec![vec![1], vec![0]]);
    }

    #[test]
    fn empty_input_has_no_pairs() {
        assert!(compute_compatibility(&[], 0.6).is_empty());
    }

    proptest! {
        #[test]
        fn compatibility_is_symmetric(
            coords in proptest::collection::vec(
                (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0),
                1..12,
            ),
            threshold in 0.0f64..1.0,
        ) {
            let segments: Vec<Segment> = coords
                .iter()
                .map(|&(x0, y0, x1, y1)| seg(x0, y0, x1, y1))
                .collect();
            let adjacency = compute_compatibility(&segments, threshold);
            for (i, row) in adjacency.iter().enumerate() {
                prop_assert!(!row.contains(&i));
                for &j in row {
                    prop_assert!(adjacency[j].contains(&i));
                }
            }
        }

        #[test]
        fn score_stays_in_unit_interval(
            a in (-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0),
            b in (-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0),
        ) {
            let p = seg(a.0, a.1, a.2, a.3);
            let q = seg(b.0, b.1, b.2, b.3);
            let score = compatibility_score(&p, &q);
            prop_assert!((0.0..=1.0 + 1e-9).contains(&score));
            prop_assert!((score - compatibility_score(&q, &p)).abs() < 1e-9);
        }
    }
}
