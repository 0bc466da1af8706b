//! The bisector inside one sector.
//!
//! Inside a sector each site `s` sees a fixed front hull edge `B` (hit by the ray from
//! `s` through a point `p`) and a fixed back edge `A` (hit by the ray from `p` through
//! `s`). With the edge lines as affine forms, positive inside,
//!
//! `e^{2 d(s, p)} = A(p) B(s) / (A(s) B(p))`,
//!
//! so `d(s1, p) = d(s2, p)` becomes the conic
//!
//! `Q(p) = B1(s1) A2(s2) · A1(p) B2(p) − B2(s2) A1(s1) · A2(p) B1(p) = 0`,
//!
//! with `Q > 0` exactly where `p` is farther from `s1` than from `s2`.

use nalgebra::Matrix3;

use crate::geom2::{eval_line, GeomCfg, Homogeneous, Hull, Point, Segment};

use super::types::Sector;

/// Roots of `Q` restricted to a line.
#[derive(Clone, Debug, PartialEq)]
pub enum LineRoots {
    /// Finitely many parameters, ascending (possibly none).
    Finite(Vec<f64>),
    /// `Q` vanishes on the whole line.
    Identical,
}

/// `Q(p0 + t d) = c2 t² + c1 t + c0`, with a magnitude reference for zero tests.
#[derive(Clone, Copy, Debug)]
pub struct Quadratic {
    pub c2: f64,
    pub c1: f64,
    pub c0: f64,
    reference: f64,
}

impl Quadratic {
    /// Real roots; the leading coefficient is treated as zero below `eps · reference`.
    pub fn roots(&self, eps: f64) -> LineRoots {
        let zero = eps * self.reference;
        let (c2, c1, c0) = (self.c2, self.c1, self.c0);
        if c2.abs() <= zero {
            if c1.abs() <= zero {
                return if c0.abs() <= zero {
                    LineRoots::Identical
                } else {
                    LineRoots::Finite(Vec::new())
                };
            }
            return LineRoots::Finite(vec![-c0 / c1]);
        }
        let mut disc = c1 * c1 - 4.0 * c2 * c0;
        if disc < 0.0 {
            // tangency lost to rounding
            if disc >= -eps * (c1 * c1 + (4.0 * c2 * c0).abs()) {
                disc = 0.0;
            } else {
                return LineRoots::Finite(Vec::new());
            }
        }
        let sq = disc.sqrt();
        let q = -0.5 * (c1 + if c1 >= 0.0 { sq } else { -sq });
        if q == 0.0 {
            return LineRoots::Finite(vec![0.0]);
        }
        let (r1, r2) = (q / c2, c0 / q);
        let mut out = vec![r1.min(r2), r1.max(r2)];
        out.dedup();
        LineRoots::Finite(out)
    }
}

/// Equidistance conic of the site pair in one sector.
#[derive(Clone, Copy, Debug)]
pub struct SectorConic {
    a1: Homogeneous,
    b1: Homogeneous,
    a2: Homogeneous,
    b2: Homogeneous,
    k1: f64,
    k2: f64,
}

/// Back and front edge lines of `site` for rays through `toward`, normalized.
fn site_forms(hull: &Hull, site: Point, toward: Point) -> Option<(Homogeneous, Homogeneous)> {
    let ch = hull.chord(site, toward - site)?;
    let unit = |l: Homogeneous| l / l.xy().norm();
    Some((
        unit(hull.edge_line(ch.back_edge)),
        unit(hull.edge_line(ch.front_edge)),
    ))
}

impl SectorConic {
    /// `None` when the front/back edges cannot be resolved (degenerate hull).
    pub fn new(hull: &Hull, sector: &Sector) -> Option<Self> {
        let c = sector.centroid();
        let (s1, s2) = (sector.site1(), sector.site2());
        let (a1, b1) = site_forms(hull, s1, c)?;
        let (a2, b2) = site_forms(hull, s2, c)?;
        Some(Self {
            a1,
            b1,
            a2,
            b2,
            k1: eval_line(b1, s1) * eval_line(a2, s2),
            k2: eval_line(b2, s2) * eval_line(a1, s1),
        })
    }

    /// Symmetric matrix of `Q` in homogeneous coordinates.
    fn matrix(&self) -> Matrix3<f64> {
        let sym = |m: Matrix3<f64>| (m + m.transpose()) * 0.5;
        sym(self.a1 * self.b2.transpose()) * self.k1 - sym(self.a2 * self.b1.transpose()) * self.k2
    }

    /// Whether `Q` vanishes identically: both sites are equidistant from every point of
    /// the sector, which happens when their edge pairs coincide up to scale.
    pub fn is_degenerate(&self, cfg: &GeomCfg) -> bool {
        let reference = self.k1.abs() * (self.a1 * self.b2.transpose()).norm()
            + self.k2.abs() * (self.a2 * self.b1.transpose()).norm();
        self.matrix().norm() <= cfg.eps_det * reference
    }

    #[inline]
    pub fn eval(&self, p: Point) -> f64 {
        self.k1 * eval_line(self.a1, p) * eval_line(self.b2, p)
            - self.k2 * eval_line(self.a2, p) * eval_line(self.b1, p)
    }

    /// Restriction to the line `p0 + t d`.
    pub fn along(&self, p0: Point, d: Point) -> Quadratic {
        let lin = |l: Homogeneous| (eval_line(l, p0), l.x * d.x + l.y * d.y);
        let (a1, a1d) = lin(self.a1);
        let (b1, b1d) = lin(self.b1);
        let (a2, a2d) = lin(self.a2);
        let (b2, b2d) = lin(self.b2);
        let reference = self.k1.abs() * (a1.abs() + a1d.abs()) * (b2.abs() + b2d.abs())
            + self.k2.abs() * (a2.abs() + a2d.abs()) * (b1.abs() + b1d.abs());
        Quadratic {
            c2: self.k1 * a1d * b2d - self.k2 * a2d * b1d,
            c1: self.k1 * (a1 * b2d + a1d * b2) - self.k2 * (a2 * b1d + a2d * b1),
            c0: self.k1 * a1 * b2 - self.k2 * a2 * b1,
            reference,
        }
    }

    /// Points where the curve meets the sector boundary, snapped to sector vertices
    /// within `snap_tol` and deduplicated.
    pub fn crossings(&self, sector: &Sector, cfg: &GeomCfg) -> Vec<Point> {
        let mut out: Vec<Point> = Vec::new();
        let push = |p: Point, out: &mut Vec<Point>| {
            let snap = snap_tol(p, cfg);
            let p = sector
                .vertices()
                .iter()
                .copied()
                .find(|v| (v - p).norm() <= snap)
                .unwrap_or(p);
            let tol = crossing_tol(p, cfg);
            if !out.iter().any(|q| (q - p).norm() <= tol) {
                out.push(p);
            }
        };
        for (a, b) in sector.edges() {
            let d = b - a;
            match self.along(a, d).roots(cfg.eps_det) {
                LineRoots::Identical => {
                    push(a, &mut out);
                    push(b, &mut out);
                }
                LineRoots::Finite(ts) => {
                    for t in ts {
                        if t >= -cfg.eps_root && t <= 1.0 + cfg.eps_root {
                            push(a + d * t.clamp(0.0, 1.0), &mut out);
                        }
                    }
                }
            }
        }
        out
    }

    /// Whether `Q` changes sign along the sector boundary at `p`, i.e. `p` is where an
    /// arc of the curve enters or leaves the sector rather than a point where it only
    /// touches the boundary from outside.
    pub fn enters_at(&self, sector: &Sector, p: Point, cfg: &GeomCfg) -> bool {
        const STEP: f64 = 1e-3;
        let tol = crossing_tol(p, cfg);
        let v = sector.vertices();
        let n = v.len();
        let mut around: Option<(Point, Point)> = None;
        for i in 0..n {
            let (a, b) = (v[i], v[(i + 1) % n]);
            if (a - p).norm() <= tol {
                let prev = v[(i + n - 1) % n];
                around = Some((a + (prev - a) * STEP, a + (b - a) * STEP));
                break;
            }
            if Segment::new(a, b).contains(p, cfg.eps_boundary) && (b - p).norm() > tol {
                let h = STEP * (p - a).norm().min((b - p).norm());
                let u = (b - a) / (b - a).norm();
                around = Some((p - u * h, p + u * h));
                break;
            }
        }
        match around {
            Some((before, after)) => self.eval(before) * self.eval(after) <= 0.0,
            None => false,
        }
    }

    /// Curve points between two crossings: `samples - 1` interior points, each the root
    /// of `Q` on the perpendicular to `entry → exit` nearest to that chord.
    pub fn sample_piece(
        &self,
        sector: &Sector,
        entry: Point,
        exit: Point,
        samples: usize,
        cfg: &GeomCfg,
    ) -> Vec<Point> {
        let mut out = vec![entry];
        let chord = exit - entry;
        let len = chord.norm();
        if len == 0.0 {
            return out;
        }
        let normal = Point::new(-chord.y, chord.x) / len;
        for k in 1..samples {
            let m = entry + chord * (k as f64 / samples as f64);
            let found = match self.along(m, normal).roots(cfg.eps_det) {
                LineRoots::Identical => Some(m),
                LineRoots::Finite(ts) => ts
                    .into_iter()
                    .map(|t| m + normal * t)
                    .filter(|p| sector.contains_eps(*p, cfg.eps_boundary))
                    .min_by(|p, q| (p - m).norm().total_cmp(&(q - m).norm())),
            };
            if let Some(p) = found {
                out.push(p);
            }
        }
        out.push(exit);
        out
    }
}

/// Distance below which two crossings are the same point.
#[inline]
pub fn crossing_tol(p: Point, cfg: &GeomCfg) -> f64 {
    cfg.eps_boundary * (1.0 + p.norm())
}

/// Distance within which a crossing is moved onto a sector vertex. Roots of a
/// near-tangent quadratic are only accurate to the square root of the working precision.
#[inline]
pub fn snap_tol(p: Point, cfg: &GeomCfg) -> f64 {
    cfg.eps_det.sqrt() * (1.0 + p.norm())
}
