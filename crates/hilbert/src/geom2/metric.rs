//! Hilbert metric on a convex hull.
//!
//! For `p ≠ q` let the line through them leave the domain at `a` (beyond `p`) and `b`
//! (beyond `q`). Then
//!
//! `d(p, q) = ½ ln( |p b| · |q a| / (|p a| · |q b|) )`.
//!
//! With `p + t (q - p)` clipped to `[t_min, t_max]` (`t_min ≤ 0`, `t_max ≥ 1`) the four
//! lengths are `t_max`, `1 - t_min`, `-t_min` and `t_max - 1` times `|q - p|`.

use super::hull::Hull;
use super::types::Point;

/// Hilbert distance.
///
/// - `NaN` when the hull is degenerate (no metric).
/// - `+∞` when either point is outside the domain or on its boundary.
pub fn hilbert_distance(hull: &Hull, p: Point, q: Point) -> f64 {
    if hull.is_degenerate() {
        return f64::NAN;
    }
    if !hull.is_in_convex(p) || !hull.is_in_convex(q) {
        return f64::INFINITY;
    }
    if hull.cfg().same_point(p, q) {
        return 0.0;
    }
    let Some(ch) = hull.chord(p, q - p) else {
        return f64::INFINITY;
    };
    let pb = ch.t_max;
    let qa = 1.0 - ch.t_min;
    let pa = -ch.t_min;
    let qb = ch.t_max - 1.0;
    if pa <= 0.0 || qb <= 0.0 {
        return f64::INFINITY;
    }
    0.5 * ((pb * qa) / (pa * qb)).ln()
}

/// Boundary points `(a, b)` where the line through `p` and `q` leaves the domain,
/// `a` on the `p` side and `b` on the `q` side.
pub fn boundary_exits(hull: &Hull, p: Point, q: Point) -> Option<(Point, Point)> {
    let d = q - p;
    let ch = hull.chord(p, d)?;
    Some((p + d * ch.t_min, p + d * ch.t_max))
}

impl Hull {
    /// Hilbert distance between two points of this domain; see [`hilbert_distance`].
    #[inline]
    pub fn distance(&self, p: Point, q: Point) -> f64 {
        hilbert_distance(self, p, q)
    }
}
