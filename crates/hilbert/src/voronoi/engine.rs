//! Site list owner and query front end.
//!
//! `VoronoiEngine` mutates through `&mut self` (domain control points and sites).
//! Every read-only query goes through an `EngineSnapshot`: an `Arc` of the current
//! hull plus a copy of the sites. Snapshots are `Send + Sync`, so a caller can keep the
//! engine behind a lock and run long queries without holding it.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{HilbertError, Result};
use crate::geom2::{ConvexDomain, Hull, Point};

use super::raster::{compute_voronoi, nearest_site, RasterCfg, RasterMap};
use super::trace::BisectorTracer;
use super::types::{Bisector, Sector, TraceCfg};

/// Domain plus sites.
#[derive(Clone, Debug, Default)]
pub struct VoronoiEngine {
    domain: ConvexDomain,
    sites: Vec<Point>,
    trace_cfg: TraceCfg,
    raster_cfg: RasterCfg,
}

impl VoronoiEngine {
    pub fn new(domain: ConvexDomain) -> Self {
        Self {
            domain,
            ..Self::default()
        }
    }

    pub fn with_cfg(mut self, trace_cfg: TraceCfg, raster_cfg: RasterCfg) -> Self {
        self.trace_cfg = trace_cfg;
        self.raster_cfg = raster_cfg;
        self
    }

    #[inline]
    pub fn domain(&self) -> &ConvexDomain {
        &self.domain
    }

    #[inline]
    pub fn hull(&self) -> &Arc<Hull> {
        self.domain.hull()
    }

    #[inline]
    pub fn sites(&self) -> &[Point] {
        &self.sites
    }

    pub fn add_control_point(&mut self, p: Point) {
        self.domain.add_point(p);
    }

    pub fn remove_control_point(&mut self, p: Point) -> bool {
        self.domain.remove_point(p)
    }

    pub fn move_control_point(&mut self, index: usize, q: Point) -> bool {
        self.domain.move_point(index, q)
    }

    /// Append a site; returns its index.
    pub fn add_site(&mut self, p: Point) -> usize {
        self.sites.push(p);
        tracing::debug!(index = self.sites.len() - 1, x = p.x, y = p.y, "site added");
        self.sites.len() - 1
    }

    /// Remove the site almost equal to `p`; later indices shift down.
    pub fn remove_site(&mut self, p: Point) -> bool {
        match self.find_site(p) {
            Some(i) => {
                self.sites.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn move_site(&mut self, index: usize, q: Point) -> bool {
        match self.sites.get_mut(index) {
            Some(s) => {
                *s = q;
                true
            }
            None => false,
        }
    }

    pub fn find_site(&self, p: Point) -> Option<usize> {
        let cfg = self.domain.cfg();
        self.sites.iter().position(|&s| cfg.same_point(s, p))
    }

    #[inline]
    pub fn get_site(&self, index: usize) -> Option<Point> {
        self.sites.get(index).copied()
    }

    pub fn reset_sites(&mut self) {
        self.sites.clear();
    }

    /// Read-only view bound to the current hull snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            hull: self.domain.hull().clone(),
            sites: Arc::from(self.sites.as_slice()),
            trace_cfg: self.trace_cfg,
            raster_cfg: self.raster_cfg,
        }
    }

    pub fn nearest_site(&self, p: Point) -> Option<usize> {
        self.snapshot().nearest_site(p)
    }

    pub fn compute_voronoi(&self) -> Result<RasterMap> {
        self.snapshot().compute_voronoi()
    }

    pub fn trace_bisector(&self, i: usize, j: usize) -> Result<Bisector> {
        self.snapshot().trace_bisector(i, j)
    }

    pub fn trace_all_pairs(&self) -> Vec<(usize, usize, Result<Bisector>)> {
        self.snapshot().trace_all_pairs()
    }

    /// Trapezoidal cell decomposition of the site set. Not built yet: always `None`.
    pub fn build_cell_map(&self) -> Option<Vec<Sector>> {
        tracing::debug!(sites = self.sites.len(), "cell map requested; not available");
        None
    }
}

/// Immutable query view: one hull snapshot and the sites at snapshot time.
#[derive(Clone, Debug)]
pub struct EngineSnapshot {
    hull: Arc<Hull>,
    sites: Arc<[Point]>,
    trace_cfg: TraceCfg,
    raster_cfg: RasterCfg,
}

impl EngineSnapshot {
    #[inline]
    pub fn hull(&self) -> &Arc<Hull> {
        &self.hull
    }

    #[inline]
    pub fn sites(&self) -> &[Point] {
        &self.sites
    }

    /// Version of the hull this snapshot is bound to.
    #[inline]
    pub fn version(&self) -> u64 {
        self.hull.version()
    }

    pub fn distance(&self, p: Point, q: Point) -> f64 {
        self.hull.distance(p, q)
    }

    pub fn nearest_site(&self, p: Point) -> Option<usize> {
        nearest_site(&self.hull, &self.sites, p)
    }

    pub fn compute_voronoi(&self) -> Result<RasterMap> {
        compute_voronoi(&self.hull, &self.sites, self.raster_cfg)
    }

    fn site(&self, i: usize) -> Result<Point> {
        self.sites.get(i).copied().ok_or(HilbertError::UnknownSite(i))
    }

    /// Bisector of sites `i` and `j`.
    pub fn trace_bisector(&self, i: usize, j: usize) -> Result<Bisector> {
        let (s1, s2) = (self.site(i)?, self.site(j)?);
        BisectorTracer::new(self.hull.clone(), s1, s2, self.trace_cfg)?.trace()
    }

    /// Every unordered site pair `(i, j)`, `i < j`, traced independently in parallel.
    /// Output is ordered by `(i, j)`.
    pub fn trace_all_pairs(&self) -> Vec<(usize, usize, Result<Bisector>)> {
        let n = self.sites.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        pairs
            .into_par_iter()
            .map(|(i, j)| (i, j, self.trace_bisector(i, j)))
            .collect()
    }
}
