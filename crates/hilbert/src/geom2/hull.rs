//! Convex domain: control points, hull snapshots, containment predicates.
//!
//! Purpose
//! - `ConvexDomain` owns the user's control points. Every mutation recomputes the hull
//!   wholesale and publishes it as a new immutable `Hull` snapshot (`Arc`) with a bumped
//!   version, so queries bind to one snapshot for their whole duration.
//! - `Hull` answers containment, boundary and chord questions. Vertices are CCW and
//!   cyclic: consecutive pairs, including `(last, first)`, are the hull edges.
//!
//! Conventions
//! - Fewer than 3 control points: the hull is empty.
//! - Collinear input: the scan fails and the hull degrades to the lexicographically
//!   sorted point set (a one-dimensional "hull"); `Hull::is_degenerate` reports it.

use std::cmp::Ordering;
use std::sync::Arc;

use super::projective::{eval_line, line_through, Homogeneous};
use super::types::{orient, GeomCfg, Point};

/// Immutable hull snapshot.
#[derive(Clone, Debug)]
pub struct Hull {
    version: u64,
    vertices: Vec<Point>,
    /// Edge lines `v_i × v_{i+1}`, positive on the interior side.
    lines: Vec<Homogeneous>,
    degenerate: bool,
    cfg: GeomCfg,
}

/// Line clipped to the domain: `p + t d` is inside for `t ∈ [t_min, t_max]`.
#[derive(Clone, Copy, Debug)]
pub struct Chord {
    pub t_min: f64,
    pub t_max: f64,
    /// Hull edge crossed at `t_min`.
    pub back_edge: usize,
    /// Hull edge crossed at `t_max`.
    pub front_edge: usize,
}

impl Hull {
    fn new(version: u64, vertices: Vec<Point>, degenerate: bool, cfg: GeomCfg) -> Self {
        let n = vertices.len();
        let lines = (0..n)
            .map(|i| line_through(vertices[i], vertices[(i + 1) % n]))
            .collect();
        Self {
            version,
            vertices,
            lines,
            degenerate,
            cfg,
        }
    }

    /// Hull of a point set without going through a `ConvexDomain`.
    pub fn from_points(points: &[Point], cfg: GeomCfg) -> Self {
        let (vertices, degenerate) = compute_hull(points, &cfg);
        Hull::new(0, vertices, degenerate, cfg)
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    #[inline]
    pub fn cfg(&self) -> &GeomCfg {
        &self.cfg
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Empty, or the collinear fallback: no interior.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate || self.vertices.len() < 3
    }

    /// Edge `i` as `(v_i, v_{i+1})`, wrapping at the end.
    #[inline]
    pub fn edge(&self, i: usize) -> (Point, Point) {
        let n = self.vertices.len();
        (self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..self.vertices.len()).map(move |i| self.edge(i))
    }

    /// Edge line of edge `i`, positive on the interior side.
    #[inline]
    pub fn edge_line(&self, i: usize) -> Homogeneous {
        self.lines[i]
    }

    /// Hull vertex almost equal to `p`.
    pub fn find_point(&self, p: Point) -> Option<usize> {
        self.vertices.iter().position(|&v| self.cfg.same_point(v, p))
    }

    #[inline]
    pub fn get_point(&self, index: usize) -> Option<Point> {
        self.vertices.get(index).copied()
    }

    /// Interior-or-boundary test: the cross products of edge vectors with the
    /// point-relative vectors must not take both signs.
    pub fn is_in_convex(&self, p: Point) -> bool {
        if self.vertices.is_empty() {
            return false;
        }
        let mut pos = false;
        let mut neg = false;
        for (a, b) in self.edges() {
            let c = orient(a, b, p);
            if c > 0.0 {
                pos = true;
            } else if c < 0.0 {
                neg = true;
            }
            if pos && neg {
                return false;
            }
        }
        true
    }

    /// Whether `p` lies on some hull edge: within `eps_boundary · (1 + |p|)` of the edge
    /// line and inside the edge's bounding box grown by the same amount.
    pub fn is_on_convex_boundary(&self, p: Point) -> bool {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return false;
        }
        let tol = self.cfg.eps_boundary * (1.0 + p.norm());
        self.edges().any(|(a, b)| {
            let len = (b - a).norm();
            if len == 0.0 || orient(a, b, p).abs() > tol * len {
                return false;
            }
            let (x0, x1) = if a.x <= b.x { (a.x, b.x) } else { (b.x, a.x) };
            let (y0, y1) = if a.y <= b.y { (a.y, b.y) } else { (b.y, a.y) };
            p.x >= x0 - tol && p.x <= x1 + tol && p.y >= y0 - tol && p.y <= y1 + tol
        })
    }

    /// Membership with signed slack on the edge lines (normalized): `eps > 0` enlarges.
    pub fn contains_eps(&self, p: Point, eps: f64) -> bool {
        !self.is_degenerate()
            && self
                .lines
                .iter()
                .all(|l| eval_line(*l, p) / l.xy().norm() >= -eps)
    }

    /// Strictly inside: in the domain and not on its boundary.
    pub fn is_interior(&self, p: Point) -> bool {
        !self.is_degenerate() && self.is_in_convex(p) && !self.is_on_convex_boundary(p)
    }

    /// Clip the line `p + t d` against the hull edges.
    ///
    /// `p` is expected inside or on the boundary; `None` when the hull is degenerate,
    /// `d = 0`, or the line misses the domain.
    pub fn chord(&self, p: Point, d: Point) -> Option<Chord> {
        if self.is_degenerate() || d.norm() == 0.0 {
            return None;
        }
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        let mut back_edge = usize::MAX;
        let mut front_edge = usize::MAX;
        for (i, l) in self.lines.iter().enumerate() {
            // l·(p + t d, 1) >= 0
            let num = eval_line(*l, p);
            let den = l.x * d.x + l.y * d.y;
            if den.abs() <= self.cfg.eps_det * l.xy().norm() * d.norm() {
                continue;
            }
            let t = -num / den;
            if den < 0.0 {
                if t < t_max {
                    t_max = t;
                    front_edge = i;
                }
            } else if t > t_min {
                t_min = t;
                back_edge = i;
            }
        }
        if front_edge == usize::MAX || back_edge == usize::MAX || t_min > t_max {
            return None;
        }
        Some(Chord {
            t_min,
            t_max,
            back_edge,
            front_edge,
        })
    }

    /// Axis-aligned bounding box `(min, max)`.
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Point::new(lo.x.min(v.x), lo.y.min(v.y)),
                Point::new(hi.x.max(v.x), hi.y.max(v.y)),
            )
        }))
    }

    /// Twice the signed area (positive for the CCW hull).
    pub fn area2(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| {
                let p = self.vertices[i];
                let q = self.vertices[(i + 1) % n];
                p.x * q.y - q.x * p.y
            })
            .sum()
    }

    /// Vertex mean; strictly interior for a non-degenerate hull.
    pub fn centroid(&self) -> Option<Point> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self.vertices.iter().fold(Point::zeros(), |acc, v| acc + v);
        Some(sum / self.vertices.len() as f64)
    }
}

/// Control points plus the current hull snapshot.
#[derive(Clone, Debug)]
pub struct ConvexDomain {
    points: Vec<Point>,
    hull: Arc<Hull>,
    version: u64,
    cfg: GeomCfg,
}

impl Default for ConvexDomain {
    fn default() -> Self {
        Self::new(GeomCfg::default())
    }
}

impl ConvexDomain {
    pub fn new(cfg: GeomCfg) -> Self {
        Self {
            points: Vec::new(),
            hull: Arc::new(Hull::new(0, Vec::new(), true, cfg)),
            version: 0,
            cfg,
        }
    }

    /// Domain from control points; almost-equal duplicates are dropped (first kept).
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I, cfg: GeomCfg) -> Self {
        let mut unique: Vec<Point> = Vec::new();
        for p in points {
            if !unique.iter().any(|&q| cfg.same_point(p, q)) {
                unique.push(p);
            }
        }
        let mut d = Self::new(cfg);
        d.points = unique;
        d.recompute();
        d
    }

    #[inline]
    pub fn control_points(&self) -> &[Point] {
        &self.points
    }

    /// Current hull snapshot.
    #[inline]
    pub fn hull(&self) -> &Arc<Hull> {
        &self.hull
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn cfg(&self) -> &GeomCfg {
        &self.cfg
    }

    pub fn add_point(&mut self, p: Point) {
        self.points.push(p);
        self.recompute();
    }

    /// Remove the control point almost equal to `p`. Returns whether one was removed.
    pub fn remove_point(&mut self, p: Point) -> bool {
        let Some(i) = self.points.iter().position(|&q| self.cfg.same_point(p, q)) else {
            return false;
        };
        self.points.remove(i);
        self.recompute();
        true
    }

    /// Move hull vertex `index` to `q`; the matching control point is replaced.
    pub fn move_point(&mut self, index: usize, q: Point) -> bool {
        let Some(v) = self.hull.get_point(index) else {
            return false;
        };
        let Some(i) = self.points.iter().position(|&p| self.cfg.same_point(p, v)) else {
            return false;
        };
        self.points[i] = q;
        self.recompute();
        true
    }

    /// Index into the current hull of the vertex almost equal to `p`.
    #[inline]
    pub fn find_point(&self, p: Point) -> Option<usize> {
        self.hull.find_point(p)
    }

    #[inline]
    pub fn get_point(&self, index: usize) -> Option<Point> {
        self.hull.get_point(index)
    }

    fn recompute(&mut self) {
        self.version += 1;
        let (vertices, degenerate) = if self.points.len() < 3 {
            (Vec::new(), true)
        } else {
            compute_hull(&self.points, &self.cfg)
        };
        tracing::debug!(
            version = self.version,
            control_points = self.points.len(),
            hull_vertices = vertices.len(),
            degenerate,
            "hull recomputed"
        );
        self.hull = Arc::new(Hull::new(self.version, vertices, degenerate, self.cfg));
    }
}

/// Hull vertices (CCW) and whether the collinear fallback was used.
fn compute_hull(points: &[Point], cfg: &GeomCfg) -> (Vec<Point>, bool) {
    match graham_scan(points, cfg) {
        Some(h) => (h, false),
        None => (sorted_point_set(points, cfg), true),
    }
}

fn lex_cmp(a: &Point, b: &Point) -> Ordering {
    match a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal),
        o => o,
    }
}

fn sorted_point_set(points: &[Point], cfg: &GeomCfg) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(lex_cmp);
    pts.dedup_by(|a, b| cfg.same_point(*a, *b));
    pts
}

/// Graham scan: polar sort around the lowest point, then a stack of left turns.
/// `None` when fewer than three extremal points survive (collinear input).
fn graham_scan(points: &[Point], cfg: &GeomCfg) -> Option<Vec<Point>> {
    let mut pts = sorted_point_set(points, cfg);
    if pts.len() < 3 {
        return None;
    }
    let pivot_idx = pts
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| match a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal),
            o => o,
        })
        .map(|(i, _)| i)?;
    let pivot = pts.swap_remove(pivot_idx);
    pts.sort_by(|a, b| {
        let aa = (a.y - pivot.y).atan2(a.x - pivot.x);
        let bb = (b.y - pivot.y).atan2(b.x - pivot.x);
        match aa.partial_cmp(&bb).unwrap_or(Ordering::Equal) {
            Ordering::Equal => (a - pivot)
                .norm_squared()
                .partial_cmp(&(b - pivot).norm_squared())
                .unwrap_or(Ordering::Equal),
            o => o,
        }
    });
    let mut stack: Vec<Point> = Vec::with_capacity(pts.len() + 1);
    stack.push(pivot);
    for p in pts {
        while stack.len() >= 2 && orient(stack[stack.len() - 2], stack[stack.len() - 1], p) <= 0.0 {
            stack.pop();
        }
        stack.push(p);
    }
    // drop vertices left collinear on the closing edge
    let mut hull: Vec<Point> = Vec::with_capacity(stack.len());
    let n = stack.len();
    for i in 0..n {
        let prev = stack[(i + n - 1) % n];
        let next = stack[(i + 1) % n];
        let o = orient(prev, stack[i], next);
        let scale = (stack[i] - prev).norm() * (next - stack[i]).norm();
        if o > cfg.eps_det * scale {
            hull.push(stack[i]);
        }
    }
    if hull.len() < 3 {
        None
    } else {
        Some(hull)
    }
}
