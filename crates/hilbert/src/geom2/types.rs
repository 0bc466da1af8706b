//! Basic 2D types and tolerances shared by the hull, metric and graph code.
//!
//! - `GeomCfg`: centralizes epsilons. Each tolerance has exactly one purpose; do not
//!   substitute one for another.
//! - `Segment`: unordered point pair with a canonical (left, right) ordering.

use nalgebra::Vector2;

/// Cartesian point in the plane.
pub type Point = Vector2<f64>;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug)]
pub struct GeomCfg {
    /// Vanishing determinants, homogeneous `w ≈ 0`, vanishing polynomial coefficients.
    pub eps_det: f64,
    /// "Almost equal" points (dedup of nodes and control points, lookups).
    /// Scaled by `1 + |p|` so the threshold follows coordinate magnitude.
    pub eps_same: f64,
    /// Boundary membership: distance to a hull edge, scaled by `1 + |p|` like
    /// `eps_same`. Also the distance at which two curve crossings merge.
    pub eps_boundary: f64,
    /// Equidistance acceptance of the numeric spoke search.
    pub eps_equidistant: f64,
    /// Slack on a segment parameter when accepting a curve/edge crossing.
    pub eps_root: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_det: 1e-12,
            eps_same: 1e-12,
            eps_boundary: 1e-8,
            eps_equidistant: 1e-3,
            eps_root: 1e-9,
        }
    }
}

impl GeomCfg {
    /// Almost-equal test used for deduplication and lookups.
    #[inline]
    pub fn same_point(&self, a: Point, b: Point) -> bool {
        (a - b).norm() <= self.eps_same * (1.0 + a.norm().max(b.norm()))
    }
}

/// Signed area of the parallelogram spanned by `a` and `b`.
/// Positive for a→b counterclockwise.
#[inline]
pub fn cross2(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Orientation of the turn `a → b → c` (twice the signed triangle area).
#[inline]
pub fn orient(a: Point, b: Point, c: Point) -> f64 {
    cross2(b - a, c - a)
}

/// Segment with endpoints stored in canonical order (by x, then y).
///
/// Two segments built from the same endpoints in either order compare equal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    left: Point,
    right: Point,
}

impl Segment {
    pub fn new(p: Point, q: Point) -> Self {
        if (p.x, p.y) <= (q.x, q.y) {
            Self { left: p, right: q }
        } else {
            Self { left: q, right: p }
        }
    }

    #[inline]
    pub fn left(&self) -> Point {
        self.left
    }

    #[inline]
    pub fn right(&self) -> Point {
        self.right
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.right - self.left).norm()
    }

    /// Endpoint-wise almost-equality.
    pub fn same_as(&self, other: &Segment, cfg: &GeomCfg) -> bool {
        cfg.same_point(self.left, other.left) && cfg.same_point(self.right, other.right)
    }

    /// Whether `p` lies inside the segment's axis-aligned bounding box (with `slack`).
    pub fn bbox_contains(&self, p: Point, slack: f64) -> bool {
        let (x0, x1) = (self.left.x.min(self.right.x), self.left.x.max(self.right.x));
        let (y0, y1) = (self.left.y.min(self.right.y), self.left.y.max(self.right.y));
        p.x >= x0 - slack && p.x <= x1 + slack && p.y >= y0 - slack && p.y <= y1 + slack
    }

    /// Parameter of the projection of `p` onto the segment, `0` at `left`, `1` at `right`.
    pub fn param_of(&self, p: Point) -> f64 {
        let d = self.right - self.left;
        let len2 = d.norm_squared();
        if len2 == 0.0 {
            return 0.0;
        }
        (p - self.left).dot(&d) / len2
    }

    /// Whether `p` lies on the segment: within `eps` of its carrier line (relative to
    /// the segment length) and within the endpoint range.
    pub fn contains(&self, p: Point, eps: f64) -> bool {
        let d = self.right - self.left;
        let len = d.norm();
        if len == 0.0 {
            return (p - self.left).norm() <= eps;
        }
        let off = cross2(d, p - self.left).abs() / len;
        if off > eps * (1.0 + len) {
            return false;
        }
        let t = self.param_of(p);
        let slack = eps * (1.0 + len) / len;
        (-slack..=1.0 + slack).contains(&t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn segment_order_is_canonical() {
        let a = vector![3.0, 1.0];
        let b = vector![1.0, 5.0];
        assert_eq!(Segment::new(a, b), Segment::new(b, a));
        assert_eq!(Segment::new(a, b).left(), b);
        // same x: ordered by y
        let s = Segment::new(vector![0.0, 2.0], vector![0.0, -1.0]);
        assert_eq!(s.left(), vector![0.0, -1.0]);
    }

    #[test]
    fn segment_contains_is_bounded() {
        let s = Segment::new(vector![0.0, 0.0], vector![10.0, 10.0]);
        assert!(s.contains(vector![5.0, 5.0], 1e-9));
        assert!(s.contains(vector![10.0, 10.0], 1e-9));
        assert!(!s.contains(vector![11.0, 11.0], 1e-9));
        assert!(!s.contains(vector![5.0, 5.1], 1e-9));
    }

    #[test]
    fn same_point_scales_with_magnitude() {
        let cfg = GeomCfg::default();
        let p = vector![1000.0, 1000.0];
        assert!(cfg.same_point(p, p + vector![1e-10, 0.0]));
        assert!(!cfg.same_point(p, p + vector![1e-6, 0.0]));
    }
}
