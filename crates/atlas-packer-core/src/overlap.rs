//! Separating axis test for convex polygons.
use crate::geometry::{Vec2, perp};

fn project(axis: Vec2, poly: &[Vec2]) -> (f32, f32) {
    poly.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
        let d = axis.dot(*p);
        (lo.min(d), hi.max(d))
    })
}

fn separated_along_edges_of(edges: &[Vec2], a: &[Vec2], b: &[Vec2]) -> bool {
    let n = edges.len();
    for i in 0..n {
        let Some(dir) = (edges[(i + 1) % n] - edges[i]).try_normalize() else {
            // degenerate edge, no axis to test
            continue;
        };
        let axis = perp(dir);
        let (min_a, max_a) = project(axis, a);
        let (min_b, max_b) = project(axis, b);
        if max_a < min_b || max_b < min_a {
            return true;
        }
    }
    false
}

/// Returns true if the convex polygons `a` and `b` (vertex loops, CCW) overlap.
///
/// Touching polygons count as overlapping. The result does not depend on argument order.
/// Empty polygons never overlap anything.
pub fn overlaps(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    !separated_along_edges_of(a, a, b) && !separated_along_edges_of(b, a, b)
}

/// Axis-aligned quad `[min, max]` as a CCW vertex loop (y up).
pub fn quad(min: Vec2, max: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(min.x, min.y),
        Vec2::new(max.x, min.y),
        Vec2::new(max.x, max.y),
        Vec2::new(min.x, max.y),
    ]
}
