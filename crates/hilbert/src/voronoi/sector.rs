//! Sector construction: faces of the spoke graph.
//!
//! The face to the left of a directed edge `u → v` is walked by taking, at `v`, the
//! neighbor that precedes `u` in `v`'s counterclockwise neighbor order. Faces come out
//! CCW with positive area; the single outer face has negative area and is dropped.
//!
//! Because each site contributes full chords (spoke plus backward extension), every
//! bounded face is convex.

use std::collections::HashSet;

use crate::geom2::{Point, Segment};

use super::types::{NodeId, Sector, SpokeGraph};

/// Next node on the face to the left of `u → v`.
fn next_on_left_face(graph: &SpokeGraph, u: NodeId, v: NodeId) -> Option<NodeId> {
    let around = graph.neighbors_by_angle(v, graph.point(v));
    let k = around.iter().position(|&w| w == u)?;
    let prev = if k == 0 { around.len() - 1 } else { k - 1 };
    Some(around[prev])
}

/// Node cycle of the face to the left of `a → b`.
fn walk_left_face(graph: &SpokeGraph, a: NodeId, b: NodeId) -> Option<Vec<NodeId>> {
    let mut cycle = Vec::new();
    let (mut u, mut v) = (a, b);
    // every directed edge is used at most once per face
    for _ in 0..=2 * graph.edge_count() {
        cycle.push(u);
        let w = next_on_left_face(graph, u, v)?;
        (u, v) = (v, w);
        if u == a && v == b {
            return Some(cycle);
        }
    }
    None
}

fn face_to_sector(graph: &SpokeGraph, cycle: Vec<NodeId>) -> Option<Sector> {
    if cycle.len() < 3 {
        return None;
    }
    let vertices = cycle.iter().map(|&id| graph.point(id)).collect();
    let sector = Sector::new(cycle, vertices, graph.site1(), graph.site2());
    if sector.area2() > 0.0 {
        Some(sector)
    } else {
        None
    }
}

/// Sectors adjacent to the graph edge `a – b` (at most two: one per side).
pub fn construct_sector(graph: &SpokeGraph, a: NodeId, b: NodeId) -> Vec<Sector> {
    [(a, b), (b, a)]
        .into_iter()
        .filter_map(|(u, v)| walk_left_face(graph, u, v))
        .filter_map(|cycle| face_to_sector(graph, cycle))
        .collect()
}

/// Every bounded face of the graph.
pub fn all_sectors(graph: &SpokeGraph) -> Vec<Sector> {
    let mut used: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut out = Vec::new();
    for (a, b) in graph.edges() {
        for (u, v) in [(a, b), (b, a)] {
            if used.contains(&(u, v)) {
                continue;
            }
            let Some(cycle) = walk_left_face(graph, u, v) else {
                continue;
            };
            let n = cycle.len();
            for i in 0..n {
                used.insert((cycle[i], cycle[(i + 1) % n]));
            }
            if let Some(s) = face_to_sector(graph, cycle) {
                out.push(s);
            }
        }
    }
    out
}

/// Node within `tol` (scaled by `1 + |p|`) of `p`, if any.
pub fn node_near(graph: &SpokeGraph, p: Point, tol: f64) -> Option<NodeId> {
    let lim = tol * (1.0 + p.norm());
    graph
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| (n.point - p).norm() <= lim)
        .min_by(|(_, x), (_, y)| {
            (x.point - p)
                .norm()
                .total_cmp(&(y.point - p).norm())
        })
        .map(|(i, _)| NodeId(i))
}

/// Sectors whose boundary passes through `p`: every sector around the node at `p`, or
/// the (up to two) sectors sharing the edge that contains `p`.
pub fn sectors_around(graph: &SpokeGraph, p: Point) -> Vec<Sector> {
    let eps = graph.cfg().eps_boundary;
    let mut out: Vec<Sector> = Vec::new();
    let mut keys: HashSet<Vec<NodeId>> = HashSet::new();
    let mut push_all = |found: Vec<Sector>, out: &mut Vec<Sector>| {
        for s in found {
            if keys.insert(s.key()) {
                out.push(s);
            }
        }
    };
    if let Some(id) = node_near(graph, p, eps) {
        for &nb in graph.neighbors(id) {
            push_all(construct_sector(graph, id, nb), &mut out);
        }
        return out;
    }
    for (a, b) in graph.edges() {
        if Segment::new(graph.point(a), graph.point(b)).contains(p, eps) {
            push_all(construct_sector(graph, a, b), &mut out);
        }
    }
    out
}
