//! Homogeneous coordinates in the projective plane.
//!
//! A point `(x, y)` embeds as `(x, y, 1)`. Lines use the same triple representation
//! `(a, b, c)` for `a x + b y + c = 0`; by duality the cross product of two points is the
//! line through them and the cross product of two lines is their intersection point.

use nalgebra::Vector3;

use super::types::{GeomCfg, Point, Segment};

/// Homogeneous point or line triple.
pub type Homogeneous = Vector3<f64>;

#[inline]
pub fn to_homogeneous(p: Point) -> Homogeneous {
    Vector3::new(p.x, p.y, 1.0)
}

/// Divide through by `w`. `None` when `w ≈ 0` (point at infinity).
#[inline]
pub fn to_cartesian(h: Homogeneous, eps: f64) -> Option<Point> {
    if !(h.z.abs() > eps) {
        return None;
    }
    let p = Point::new(h.x / h.z, h.y / h.z);
    if p.x.is_finite() && p.y.is_finite() {
        Some(p)
    } else {
        None
    }
}

/// 3-vector cross product (line through two points, or meet of two lines).
#[inline]
pub fn cross(a: Homogeneous, b: Homogeneous) -> Homogeneous {
    a.cross(&b)
}

/// Line through two Cartesian points.
#[inline]
pub fn line_through(p: Point, q: Point) -> Homogeneous {
    cross(to_homogeneous(p), to_homogeneous(q))
}

/// Intersection of two lines; `None` for parallel (or identical) lines.
///
/// The `w` test is relative to the line coefficients so scaling a line does not change
/// the verdict.
pub fn intersect_lines(l1: Homogeneous, l2: Homogeneous, eps: f64) -> Option<Point> {
    let h = cross(l1, l2);
    let scale = l1.xy().norm() * l2.xy().norm();
    if scale == 0.0 {
        return None;
    }
    to_cartesian(h, eps * scale)
}

/// Evaluate a line form at a point (`a x + b y + c`).
#[inline]
pub fn eval_line(l: Homogeneous, p: Point) -> f64 {
    l.x * p.x + l.y * p.y + l.z
}

/// Intersection of two bounded segments, kept only inside both bounding boxes.
///
/// Endpoints count as intersections. Collinear overlaps report `None`.
pub fn segment_intersection(s1: &Segment, s2: &Segment, cfg: &GeomCfg) -> Option<Point> {
    let l1 = line_through(s1.left(), s1.right());
    let l2 = line_through(s2.left(), s2.right());
    let p = intersect_lines(l1, l2, cfg.eps_det)?;
    if s1.bbox_contains(p, cfg.eps_boundary) && s2.bbox_contains(p, cfg.eps_boundary) {
        Some(p)
    } else {
        None
    }
}

/// Bearing of `q` as seen from `from`, in `[0, 2π)`.
pub fn spoke_angle(from: Point, q: Point) -> f64 {
    let d = q - from;
    let a = d.y.atan2(d.x);
    if a < 0.0 {
        let w = a + std::f64::consts::TAU;
        if w >= std::f64::consts::TAU {
            0.0
        } else {
            w
        }
    } else {
        a
    }
}

/// Lines through `site` at the `n` equally spaced angles `k · 2π / n`.
pub fn theta_rays(site: Point, n: usize) -> Vec<Homogeneous> {
    (0..n)
        .map(|k| {
            let th = (k as f64) * std::f64::consts::TAU / (n as f64);
            line_through(site, site + Point::new(th.cos(), th.sin()))
        })
        .collect()
}

/// `n + 1` lines through `site` sweeping the angular range between the bearings of
/// `from` and `to` (smaller bearing first).
pub fn theta_rays_between(site: Point, from: Point, to: Point, n: usize) -> Vec<Homogeneous> {
    if n == 0 {
        return Vec::new();
    }
    let mut th0 = spoke_angle(site, from);
    let mut th1 = spoke_angle(site, to);
    if th1 < th0 {
        std::mem::swap(&mut th0, &mut th1);
    }
    (0..=n)
        .map(|k| {
            let th = th0 + (k as f64) * (th1 - th0) / (n as f64);
            line_through(site, site + Point::new(th.cos(), th.sin()))
        })
        .collect()
}
