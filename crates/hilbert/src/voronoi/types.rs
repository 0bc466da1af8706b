//! Data types for the spoke graph, its sectors and traced bisectors.
//!
//! Kept small and explicit so `build`, `sector` and `trace` read easily.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::geom2::{orient, spoke_angle, GeomCfg, Hull, Point};

/// Arena handle of a graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A point plus the nodes reachable from it by an intersection-free sub-segment.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub point: Point,
    pub neighbors: Vec<NodeId>,
}

/// Planar graph of hull edges and site spokes, cut at every pairwise intersection.
///
/// Nodes are deduplicated on insertion (`GeomCfg::same_point`); no two nodes share a
/// physical point. The graph binds to one hull snapshot.
#[derive(Clone, Debug)]
pub struct SpokeGraph {
    hull: Arc<Hull>,
    nodes: Vec<GraphNode>,
    sites: [Point; 2],
    cfg: GeomCfg,
}

impl SpokeGraph {
    /// Empty graph for the site pair over `hull`.
    pub fn new(hull: Arc<Hull>, site1: Point, site2: Point, cfg: GeomCfg) -> Self {
        Self {
            hull,
            nodes: Vec::new(),
            sites: [site1, site2],
            cfg,
        }
    }

    #[inline]
    pub fn hull(&self) -> &Arc<Hull> {
        &self.hull
    }

    #[inline]
    pub fn cfg(&self) -> &GeomCfg {
        &self.cfg
    }

    #[inline]
    pub fn site1(&self) -> Point {
        self.sites[0]
    }

    #[inline]
    pub fn site2(&self) -> Point {
        self.sites[1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn point(&self, id: NodeId) -> Point {
        self.nodes[id.0].point
    }

    #[inline]
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].neighbors
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors.len()).sum::<usize>() / 2
    }

    /// Undirected edges as `(lo, hi)` id pairs.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.iter().enumerate().flat_map(|(i, n)| {
            n.neighbors
                .iter()
                .filter(move |nb| nb.0 > i)
                .map(move |&nb| (NodeId(i), nb))
        })
    }

    /// Node almost equal to `p`.
    pub fn find_node(&self, p: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| self.cfg.same_point(n.point, p))
            .map(NodeId)
    }

    /// Insert `p`, or return the existing node almost equal to it.
    pub fn insert_point(&mut self, p: Point) -> NodeId {
        if let Some(id) = self.find_node(p) {
            return id;
        }
        self.nodes.push(GraphNode {
            point: p,
            neighbors: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Connect two distinct nodes; repeated edges are ignored.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.nodes[a.0].neighbors.contains(&b) {
            return;
        }
        self.nodes[a.0].neighbors.push(b);
        self.nodes[b.0].neighbors.push(a);
    }

    /// Neighbors of `id` sorted by their bearing as seen from `origin`, in `[0, 2π)`.
    pub fn neighbors_by_angle(&self, id: NodeId, origin: Point) -> Vec<NodeId> {
        let mut out = self.nodes[id.0].neighbors.clone();
        out.sort_by(|a, b| {
            spoke_angle(origin, self.point(*a))
                .partial_cmp(&spoke_angle(origin, self.point(*b)))
                .unwrap_or(Ordering::Equal)
        });
        out
    }

    /// Whether node `id` sits on the hull boundary.
    #[inline]
    pub fn on_boundary(&self, id: NodeId) -> bool {
        self.hull.is_on_convex_boundary(self.point(id))
    }
}

/// Convex face of the spoke graph, listed CCW.
///
/// Holds node ids into the graph it was built from and copies of their points; the
/// sites are copies as well. `key` identifies the face independently of where its
/// walk started.
#[derive(Clone, Debug)]
pub struct Sector {
    nodes: Vec<NodeId>,
    vertices: Vec<Point>,
    site1: Point,
    site2: Point,
}

impl Sector {
    pub(crate) fn new(nodes: Vec<NodeId>, vertices: Vec<Point>, site1: Point, site2: Point) -> Self {
        Self {
            nodes,
            vertices,
            site1,
            site2,
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    #[inline]
    pub fn site1(&self) -> Point {
        self.site1
    }

    #[inline]
    pub fn site2(&self) -> Point {
        self.site2
    }

    /// Node cycle rotated to start at its smallest id.
    pub fn key(&self) -> Vec<NodeId> {
        let Some(start) = self
            .nodes
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| **id)
            .map(|(i, _)| i)
        else {
            return Vec::new();
        };
        let mut key = self.nodes[start..].to_vec();
        key.extend_from_slice(&self.nodes[..start]);
        key
    }

    /// Boundary edges `(v_i, v_{i+1})`, wrapping.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Whether the edge between nodes `a` and `b` is a side of this sector.
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        let n = self.nodes.len();
        (0..n).any(|i| {
            let (u, v) = (self.nodes[i], self.nodes[(i + 1) % n]);
            (u == a && v == b) || (u == b && v == a)
        })
    }

    /// Twice the signed area; positive for a proper (CCW) sector.
    pub fn area2(&self) -> f64 {
        self.edges().map(|(p, q)| p.x * q.y - q.x * p.y).sum()
    }

    /// Vertex mean; strictly interior for a convex sector with positive area.
    pub fn centroid(&self) -> Point {
        let sum = self.vertices.iter().fold(Point::zeros(), |acc, v| acc + v);
        sum / self.vertices.len().max(1) as f64
    }

    /// Winding test over the sector's own vertices (interior or boundary).
    pub fn contains(&self, p: Point) -> bool {
        let mut pos = false;
        let mut neg = false;
        for (a, b) in self.edges() {
            let c = orient(a, b, p);
            if c > 0.0 {
                pos = true;
            } else if c < 0.0 {
                neg = true;
            }
        }
        !(pos && neg)
    }

    /// Like `contains`, with each side pushed out by `eps` (normalized distance).
    pub fn contains_eps(&self, p: Point, eps: f64) -> bool {
        self.edges().all(|(a, b)| {
            let len = (b - a).norm();
            len == 0.0 || orient(a, b, p) / len >= -eps
        })
    }

    /// Clip `p0 + t d`, `t ∈ [0, 1]`, to the sector. Returns the surviving parameter
    /// range, or `None` when the segment misses the sector.
    pub fn clip_segment(&self, p0: Point, d: Point, eps: f64) -> Option<(f64, f64)> {
        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        for (a, b) in self.edges() {
            let e = b - a;
            let len = e.norm();
            if len == 0.0 {
                continue;
            }
            // normalized signed distance to the side: f(t) = f0 + t f1, inside when >= -eps
            let f0 = orient(a, b, p0) / len + eps;
            let f1 = (e.x * d.y - e.y * d.x) / len;
            if f1.abs() <= f64::EPSILON * (1.0 + f0.abs()) {
                if f0 < 0.0 {
                    return None;
                }
                continue;
            }
            let t = -f0 / f1;
            if f1 > 0.0 {
                lo = lo.max(t);
            } else {
                hi = hi.min(t);
            }
            if lo > hi {
                return None;
            }
        }
        Some((lo, hi))
    }
}

/// Bisector restricted to one sector: entry crossing, interior samples, exit crossing.
#[derive(Clone, Debug)]
pub struct BisectorPiece {
    /// Key of the sector the piece lives in.
    pub sector: Vec<NodeId>,
    pub points: Vec<Point>,
}

impl BisectorPiece {
    #[inline]
    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    #[inline]
    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            sector: self.sector.clone(),
            points,
        }
    }
}

/// Traced bisector of two sites: per-sector pieces in curve order.
#[derive(Clone, Debug)]
pub struct Bisector {
    pub site1: Point,
    pub site2: Point,
    pub pieces: Vec<BisectorPiece>,
    /// Sector-to-sector transitions taken by the trace.
    pub transitions: usize,
    /// Sectors in the arrangement (the transition budget unless overridden).
    pub sector_count: usize,
}

impl Bisector {
    /// Assemble from the two walk directions away from the seed piece.
    pub(crate) fn from_walks(
        site1: Point,
        site2: Point,
        backward: Vec<BisectorPiece>,
        seed: BisectorPiece,
        forward: Vec<BisectorPiece>,
        transitions: usize,
        sector_count: usize,
    ) -> Self {
        let mut pieces: Vec<BisectorPiece> = backward.iter().rev().map(|p| p.reversed()).collect();
        pieces.push(seed);
        pieces.extend(forward);
        Self {
            site1,
            site2,
            pieces,
            transitions,
            sector_count,
        }
    }

    /// All piece points joined into one polyline (shared joints emitted once).
    pub fn polyline(&self) -> Vec<Point> {
        let mut out: Vec<Point> = Vec::new();
        for piece in &self.pieces {
            for &p in &piece.points {
                if out.last().is_some_and(|q| (q - p).norm() <= 1e-9 * (1.0 + p.norm())) {
                    continue;
                }
                out.push(p);
            }
        }
        out
    }

    /// First and last points of the polyline.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        let first = self.pieces.first()?.start()?;
        let last = self.pieces.last()?.end()?;
        Some((first, last))
    }
}

/// Tracer configuration.
#[derive(Clone, Copy, Debug)]
pub struct TraceCfg {
    pub geom: GeomCfg,
    /// Steps of the numeric equidistant-point search along a spoke.
    pub search_divisions: usize,
    /// Interior samples per bisector piece (between its two crossings).
    pub samples_per_sector: usize,
    /// Cap on sector transitions; `None` uses the number of sectors.
    pub max_transitions: Option<usize>,
}

impl Default for TraceCfg {
    fn default() -> Self {
        Self {
            geom: GeomCfg::default(),
            search_divisions: 1000,
            samples_per_sector: 16,
            max_transitions: None,
        }
    }
}

/// States of the bisector tracer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceState {
    /// Nothing built yet.
    Init,
    /// A current sector is selected; its piece is next.
    InSector,
    /// At an exit crossing; choose the next sector or end the direction.
    Crossing,
    /// Terminal.
    Done,
}
