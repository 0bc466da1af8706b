//! Sector-to-sector bisector tracing.
//!
//! State machine
//! - `Init → InSector`: build the spoke graph, then walk the segment `site1 → site2`
//!   through sectors until the curve crosses it. The crossing is the seed and its
//!   sector the starting sector.
//! - `InSector → Crossing`: sample the curve inside the current sector between its
//!   entry and exit crossings (both ends for the starting sector).
//! - `Crossing → InSector`: the exit lies inside the domain; move to the unvisited
//!   sector around it into which the curve continues.
//! - `Crossing → Crossing | Done`: the exit is on the hull boundary, or no sector
//!   continues the curve, or the transition budget is spent. The first direction hands
//!   over to the second (from the seed sector's other crossing); the second finishes.
//!
//! Each transition enters a sector not visited before, so the walk ends after at most
//! as many transitions as the arrangement has sectors; `TraceCfg::max_transitions`
//! caps it further.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{HilbertError, Result};
use crate::geom2::{spoke_angle, GeomCfg, Hull, Point};

use super::build::build_graph;
use super::conic::{crossing_tol, LineRoots, SectorConic};
use super::sector::{all_sectors, construct_sector, sectors_around};
use super::types::{Bisector, BisectorPiece, NodeId, Sector, SpokeGraph, TraceCfg, TraceState};

/// Traces the Hilbert bisector of two sites, one sector per step.
#[derive(Debug)]
pub struct BisectorTracer {
    hull: Arc<Hull>,
    site1: Point,
    site2: Point,
    cfg: TraceCfg,
    state: TraceState,
    graph: Option<SpokeGraph>,
    sector_count: usize,
    budget: usize,
    transitions: usize,
    visited: HashSet<Vec<NodeId>>,
    current: Option<Sector>,
    /// Entry and exit crossings of `current`; no entry while in the seed sector.
    entry: Option<Point>,
    exit: Option<Point>,
    /// Crossing the walk currently stands on.
    at: Point,
    /// 0 walks away from the seed piece's start, 1 from its end.
    direction: usize,
    other_end: Option<Point>,
    seed: Option<BisectorPiece>,
    walks: [Vec<BisectorPiece>; 2],
}

impl BisectorTracer {
    /// Validate the query; nothing is built until the first `step`.
    pub fn new(hull: Arc<Hull>, site1: Point, site2: Point, cfg: TraceCfg) -> Result<Self> {
        if hull.is_degenerate() {
            return Err(HilbertError::DegenerateDomain {
                control_points: hull.len(),
            });
        }
        for s in [site1, site2] {
            if !hull.is_interior(s) {
                return Err(HilbertError::PointOutsideDomain { x: s.x, y: s.y });
            }
        }
        if cfg.geom.same_point(site1, site2) {
            return Err(HilbertError::CoincidentSites);
        }
        Ok(Self {
            hull,
            site1,
            site2,
            cfg,
            state: TraceState::Init,
            graph: None,
            sector_count: 0,
            budget: 0,
            transitions: 0,
            visited: HashSet::new(),
            current: None,
            entry: None,
            exit: None,
            at: site1,
            direction: 0,
            other_end: None,
            seed: None,
            walks: [Vec::new(), Vec::new()],
        })
    }

    #[inline]
    pub fn state(&self) -> TraceState {
        self.state
    }

    #[inline]
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// The spoke graph, once `Init` has run.
    #[inline]
    pub fn graph(&self) -> Option<&SpokeGraph> {
        self.graph.as_ref()
    }

    #[inline]
    pub fn current_sector(&self) -> Option<&Sector> {
        self.current.as_ref()
    }

    /// Advance by one transition. Stepping a finished tracer is a no-op.
    pub fn step(&mut self) -> Result<TraceState> {
        let next = match self.state {
            TraceState::Init => self.init()?,
            TraceState::InSector => self.in_sector()?,
            TraceState::Crossing => self.crossing(),
            TraceState::Done => TraceState::Done,
        };
        if next != self.state {
            tracing::trace!(from = ?self.state, to = ?next, transitions = self.transitions, "tracer step");
        }
        self.state = next;
        Ok(next)
    }

    /// Run to `Done` and return the bisector.
    pub fn trace(mut self) -> Result<Bisector> {
        while self.step()? != TraceState::Done {}
        self.finish()
    }

    /// Collected pieces; only valid in `Done`.
    pub fn finish(self) -> Result<Bisector> {
        let seed = self.seed.ok_or(HilbertError::NoIntersection)?;
        let [backward, forward] = self.walks;
        tracing::debug!(
            transitions = self.transitions,
            sectors = self.sector_count,
            pieces = backward.len() + forward.len() + 1,
            "bisector traced"
        );
        Ok(Bisector::from_walks(
            self.site1,
            self.site2,
            backward,
            seed,
            forward,
            self.transitions,
            self.sector_count,
        ))
    }

    fn init(&mut self) -> Result<TraceState> {
        let graph = build_graph(&self.hull, self.site1, self.site2, self.cfg.geom);
        self.sector_count = all_sectors(&graph).len();
        self.budget = self.cfg.max_transitions.unwrap_or(self.sector_count);
        let (sector, seed) = locate_seed(&graph, &self.cfg).ok_or(HilbertError::NoIntersection)?;
        tracing::debug!(
            seed_x = seed.x,
            seed_y = seed.y,
            sectors = self.sector_count,
            budget = self.budget,
            "seed located"
        );
        self.visited.insert(sector.key());
        self.current = Some(sector);
        self.at = seed;
        self.graph = Some(graph);
        Ok(TraceState::InSector)
    }

    fn in_sector(&mut self) -> Result<TraceState> {
        let geom = self.cfg.geom;
        let sector = self.current.as_ref().ok_or(HilbertError::NoIntersection)?;
        let conic = SectorConic::new(&self.hull, sector).ok_or(HilbertError::NoIntersection)?;
        let Some(entry) = self.entry else {
            // seed sector: the piece runs between two crossings through the seed
            let seed = self.at;
            let (c0, c1) = if conic.is_degenerate(&geom) {
                let c0 = region_exit(&self.hull, sector, seed, &geom).unwrap_or(seed);
                (c0, region_exit(&self.hull, sector, c0, &geom).unwrap_or(seed))
            } else {
                let ends: Vec<Point> = conic
                    .crossings(sector, &geom)
                    .into_iter()
                    .filter(|&c| conic.enters_at(sector, c, &geom))
                    .collect();
                let c0 = ends.first().copied().unwrap_or(seed);
                (c0, ends.get(1).copied().unwrap_or(seed))
            };
            let points = conic.sample_piece(sector, c0, c1, self.cfg.samples_per_sector, &geom);
            self.seed = Some(BisectorPiece {
                sector: sector.key(),
                points,
            });
            self.at = c0;
            self.other_end = Some(c1);
            return Ok(TraceState::Crossing);
        };
        let exit = self.exit.unwrap_or(entry);
        let points = conic.sample_piece(sector, entry, exit, self.cfg.samples_per_sector, &geom);
        self.walks[self.direction].push(BisectorPiece {
            sector: sector.key(),
            points,
        });
        self.at = exit;
        Ok(TraceState::Crossing)
    }

    fn crossing(&mut self) -> TraceState {
        let at = self.at;
        if self.hull.is_on_convex_boundary(at) {
            return self.end_direction();
        }
        if self.transitions >= self.budget {
            tracing::warn!(budget = self.budget, "bisector trace hit its transition budget");
            return self.end_direction();
        }
        let Some(graph) = self.graph.as_ref() else {
            return TraceState::Done;
        };
        match next_sector(graph, &self.hull, at, &self.visited, &self.cfg) {
            Some((sector, exit)) => {
                tracing::trace!(at_x = at.x, at_y = at.y, nodes = sector.nodes().len(), "enter sector");
                self.transitions += 1;
                self.visited.insert(sector.key());
                self.current = Some(sector);
                self.entry = Some(at);
                self.exit = Some(exit);
                TraceState::InSector
            }
            None => self.end_direction(),
        }
    }

    fn end_direction(&mut self) -> TraceState {
        if self.direction == 0 {
            self.direction = 1;
            if let Some(p) = self.other_end.take() {
                self.at = p;
                return TraceState::Crossing;
            }
        }
        TraceState::Done
    }
}

/// Where to leave a sector in which every point is equidistant: the farthest vertex
/// from `at`, preferring vertices on the hull boundary.
fn region_exit(hull: &Hull, sector: &Sector, at: Point, cfg: &GeomCfg) -> Option<Point> {
    let tol = crossing_tol(at, cfg);
    let farthest = |pts: Vec<Point>| {
        pts.into_iter()
            .max_by(|a, b| (a - at).norm().total_cmp(&(b - at).norm()))
    };
    let candidates: Vec<Point> = sector
        .vertices()
        .iter()
        .copied()
        .filter(|v| (v - at).norm() > tol)
        .collect();
    let on_boundary: Vec<Point> = candidates
        .iter()
        .copied()
        .filter(|&v| hull.is_on_convex_boundary(v))
        .collect();
    farthest(on_boundary).or_else(|| farthest(candidates))
}

/// Unvisited sector around `at` that the curve enters at `at`, with its exit crossing.
///
/// Sectors where the curve changes sign at `at` win. Failing those, the walk continues
/// into the first unvisited sector that meets the curve elsewhere, or that is equidistant
/// throughout; near a node on a spoke through both sites the sign test can miss.
fn next_sector(
    graph: &SpokeGraph,
    hull: &Hull,
    at: Point,
    visited: &HashSet<Vec<NodeId>>,
    cfg: &TraceCfg,
) -> Option<(Sector, Point)> {
    let geom = &cfg.geom;
    let tol = crossing_tol(at, geom);
    let mut fallback: Option<(Sector, Point)> = None;
    for sector in sectors_around(graph, at) {
        if visited.contains(&sector.key()) {
            continue;
        }
        let Some(conic) = SectorConic::new(hull, &sector) else {
            continue;
        };
        if conic.is_degenerate(geom) {
            if fallback.is_none() {
                fallback = region_exit(hull, &sector, at, geom).map(|exit| (sector, exit));
            }
            continue;
        }
        let others: Vec<Point> = conic
            .crossings(&sector, geom)
            .into_iter()
            .filter(|c| (c - at).norm() > tol)
            .collect();
        let Some(exit) = others
            .iter()
            .copied()
            .find(|&c| conic.enters_at(&sector, c, geom))
            .or_else(|| others.first().copied())
        else {
            continue;
        };
        if conic.enters_at(&sector, at, geom) {
            return Some((sector, exit));
        }
        if fallback.is_none() {
            fallback = Some((sector, exit));
        }
    }
    if fallback.is_some() {
        tracing::trace!(at_x = at.x, at_y = at.y, "no sign change at crossing; taking fallback sector");
    }
    fallback
}

/// Starting sector and seed point: the first point of `site1 → site2` on the curve.
///
/// Starts in the sector at `site1` that the segment enters (found from the first
/// neighbor of `site1` whose bearing exceeds that of `site2`, else the last one), then
/// follows the segment from sector to sector. Falls back to the numeric spoke search
/// if the walk loses the segment.
fn locate_seed(graph: &SpokeGraph, cfg: &TraceCfg) -> Option<(Sector, Point)> {
    let geom = &cfg.geom;
    let (s1, s2) = (graph.site1(), graph.site2());
    let d = s2 - s1;
    let eps = geom.eps_boundary;
    let hull = graph.hull();

    let walk = || -> Option<(Sector, Point)> {
        let id1 = graph.find_node(s1)?;
        let bearing = spoke_angle(s1, s2);
        let around = graph.neighbors_by_angle(id1, s1);
        let first = around
            .iter()
            .find(|&&n| spoke_angle(s1, graph.point(n)) > bearing)
            .or(around.last())?;
        let mut current = construct_sector(graph, id1, *first)
            .into_iter()
            .find_map(|s| {
                let r = s.clip_segment(s1, d, eps)?;
                (r.1 > eps).then_some((s, r))
            })?;
        let mut seen: HashSet<Vec<NodeId>> = HashSet::new();
        loop {
            let (sector, (t0, t1)) = current;
            if !seen.insert(sector.key()) {
                return None;
            }
            let conic = SectorConic::new(hull, &sector)?;
            match conic.along(s1, d).roots(geom.eps_det) {
                LineRoots::Identical => {
                    let t = 0.5 * (t0 + t1);
                    return Some((sector, s1 + d * t));
                }
                LineRoots::Finite(ts) => {
                    if let Some(t) = ts.into_iter().find(|t| *t >= t0 - eps && *t <= t1 + eps) {
                        return Some((sector, s1 + d * t.clamp(0.0, 1.0)));
                    }
                }
            }
            if t1 >= 1.0 - eps {
                return None;
            }
            let p = s1 + d * t1;
            current = sectors_around(graph, p)
                .into_iter()
                .filter(|s| !seen.contains(&s.key()))
                .filter_map(|s| {
                    let r = s.clip_segment(s1, d, eps)?;
                    (r.1 > t1 + eps).then_some((s, r))
                })
                .max_by(|a, b| a.1 .1.total_cmp(&b.1 .1))?;
        }
    };
    if let Some(found) = walk() {
        return Some(found);
    }

    tracing::debug!("segment walk lost the site segment; falling back to spoke search");
    let p = find_equidistant_point(hull, s1, s2, s2, cfg).ok()?;
    let sector = all_sectors(graph)
        .into_iter()
        .find(|s| s.contains_eps(p, eps))?;
    let conic = SectorConic::new(hull, &sector)?;
    let seed = match conic.along(s1, d).roots(geom.eps_det) {
        LineRoots::Finite(ts) => ts
            .into_iter()
            .map(|t| s1 + d * t)
            .filter(|q| sector.contains_eps(*q, eps))
            .min_by(|a, b| (a - p).norm().total_cmp(&(b - p).norm()))
            .unwrap_or(p),
        LineRoots::Identical => p,
    };
    Some((sector, seed))
}

/// Numeric equidistant point on the spoke line from `site1` through `toward`.
///
/// The line is oriented toward `site2` (non-negative dot product with `site2 - site1`)
/// and searched from `site1` to its hull exit in `search_divisions` equal steps. The
/// first step with `|d(site1, p) − d(site2, p)| ≤ eps_equidistant` wins; otherwise
/// `SearchExhausted` reports the smallest gap seen.
pub fn find_equidistant_point(
    hull: &Hull,
    site1: Point,
    site2: Point,
    toward: Point,
    cfg: &TraceCfg,
) -> Result<Point> {
    if hull.is_degenerate() {
        return Err(HilbertError::DegenerateDomain {
            control_points: hull.len(),
        });
    }
    let divisions = cfg.search_divisions.max(1);
    let exhausted = |best_gap: f64| HilbertError::SearchExhausted {
        divisions,
        best_gap,
    };
    let mut dir = toward - site1;
    if dir.dot(&(site2 - site1)) < 0.0 {
        dir = -dir;
    }
    let Some(ch) = hull.chord(site1, dir) else {
        return Err(exhausted(f64::INFINITY));
    };
    let exit = site1 + dir * ch.t_max;
    let mut best_gap = f64::INFINITY;
    for k in 1..=divisions {
        let p = site1 + (exit - site1) * (k as f64 / divisions as f64);
        let gap = (hull.distance(site1, p) - hull.distance(site2, p)).abs();
        if gap <= cfg.geom.eps_equidistant {
            return Ok(p);
        }
        if gap < best_gap {
            best_gap = gap;
        }
    }
    Err(exhausted(best_gap))
}
