//! Spoke-graph construction for a site pair.
//!
//! Segments are the hull edges plus, for each site and each hull vertex, the spoke
//! site→vertex and its backward extension site→(opposite hull exit). Every pairwise
//! intersection inside the domain becomes a node; consecutive nodes along each segment
//! are joined by an edge.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::geom2::{segment_intersection, GeomCfg, Hull, Point, Segment};

use super::types::{NodeId, SpokeGraph};

/// Spokes of `site`: one segment to each hull vertex, plus the backward extension of
/// that line to the hull boundary. Duplicates (a backward exit landing on a vertex
/// already spoked) are dropped.
pub fn site_spokes(hull: &Hull, site: Point) -> Vec<Segment> {
    let cfg = hull.cfg();
    let mut out: Vec<Segment> = Vec::with_capacity(2 * hull.len());
    let push = |s: Segment, out: &mut Vec<Segment>| {
        if s.length() > 0.0 && !out.iter().any(|o| o.same_as(&s, cfg)) {
            out.push(s);
        }
    };
    for &v in hull.vertices() {
        if cfg.same_point(v, site) {
            continue;
        }
        push(Segment::new(site, v), &mut out);
        let d = site - v;
        if let Some(ch) = hull.chord(site, d) {
            let exit = site + d * ch.t_max;
            push(Segment::new(site, exit), &mut out);
        }
    }
    out
}

/// Build the spoke graph of `(site1, site2)` over `hull`.
///
/// Sites are expected strictly inside the domain; callers validate.
pub fn build_graph(hull: &Arc<Hull>, site1: Point, site2: Point, cfg: GeomCfg) -> SpokeGraph {
    let mut segments: Vec<Segment> = hull.edges().map(|(a, b)| Segment::new(a, b)).collect();
    for s in site_spokes(hull, site1)
        .into_iter()
        .chain(site_spokes(hull, site2))
    {
        if !segments.iter().any(|o| o.same_as(&s, &cfg)) {
            segments.push(s);
        }
    }

    let mut graph = SpokeGraph::new(hull.clone(), site1, site2, cfg);
    graph.insert_point(site1);
    graph.insert_point(site2);
    for s in &segments {
        graph.insert_point(s.left());
        graph.insert_point(s.right());
    }
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            let Some(p) = segment_intersection(&segments[i], &segments[j], &cfg) else {
                continue;
            };
            if hull.contains_eps(p, cfg.eps_boundary) {
                graph.insert_point(p);
            }
        }
    }

    // Attach every node lying on a segment, not only the ones found from that segment's
    // own intersections: collinear overlaps report no intersection.
    for s in &segments {
        let mut on: Vec<(f64, NodeId)> = graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| s.contains(n.point, cfg.eps_boundary))
            .map(|(i, n)| (s.param_of(n.point), NodeId(i)))
            .collect();
        on.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        for w in on.windows(2) {
            graph.add_edge(w[0].1, w[1].1);
        }
    }

    tracing::debug!(
        segments = segments.len(),
        nodes = graph.len(),
        edges = graph.edge_count(),
        "spoke graph built"
    );
    graph
}
