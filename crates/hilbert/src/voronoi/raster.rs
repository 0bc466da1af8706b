//! Brute-force nearest-site raster, for validating the exact tracer.
//!
//! Samples the integer bounding box of the domain on a regular grid (upper bounds
//! exclusive) and assigns every interior sample the index of its Hilbert-nearest site.
//! Ties go to the lowest index. Samples on the hull boundary are at infinite distance
//! from every site and stay unassigned, like those outside. Columns are computed in parallel with rayon; the
//! result does not depend on scheduling.

use rayon::prelude::*;

use crate::error::{HilbertError, Result};
use crate::geom2::{Hull, Point};

/// Raster configuration.
#[derive(Clone, Copy, Debug)]
pub struct RasterCfg {
    /// Grid spacing in domain units (at least 1).
    pub step: usize,
}

impl Default for RasterCfg {
    fn default() -> Self {
        Self { step: 2 }
    }
}

/// Dense grid of nearest-site indices (`None` outside the domain).
#[derive(Clone, Debug)]
pub struct RasterMap {
    x0: i64,
    y0: i64,
    step: usize,
    cols: usize,
    rows: usize,
    /// Column-major: `cells[col * rows + row]`.
    cells: Vec<Option<usize>>,
}

impl RasterMap {
    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Sample position of grid cell `(col, row)`.
    #[inline]
    pub fn position(&self, col: usize, row: usize) -> Point {
        Point::new(
            (self.x0 + (col * self.step) as i64) as f64,
            (self.y0 + (row * self.step) as i64) as f64,
        )
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<usize> {
        if col < self.cols && row < self.rows {
            self.cells[col * self.rows + row]
        } else {
            None
        }
    }

    /// Interior samples with their site index, column by column.
    pub fn samples(&self) -> impl Iterator<Item = (Point, usize)> + '_ {
        (0..self.cols).flat_map(move |c| {
            (0..self.rows).filter_map(move |r| self.get(c, r).map(|i| (self.position(c, r), i)))
        })
    }

    /// Site index of the sampled grid point closest to `p`, searching the 3×3 block of
    /// cells around `p`'s own cell.
    pub fn index_near(&self, p: Point) -> Option<usize> {
        if self.cols == 0 || self.rows == 0 {
            return None;
        }
        let s = self.step as f64;
        let cell = |v: f64, origin: i64, n: usize| -> i64 {
            (((v - origin as f64) / s).round() as i64).clamp(0, n as i64 - 1)
        };
        let (c, r) = (cell(p.x, self.x0, self.cols), cell(p.y, self.y0, self.rows));
        let mut best: Option<(f64, usize)> = None;
        for dc in -1..=1 {
            for dr in -1..=1 {
                let (cc, rr) = (c + dc, r + dr);
                if cc < 0 || rr < 0 {
                    continue;
                }
                let (cc, rr) = (cc as usize, rr as usize);
                let Some(i) = self.get(cc, rr) else {
                    continue;
                };
                let d = (self.position(cc, rr) - p).norm();
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, i));
                }
            }
        }
        best.map(|(_, i)| i)
    }
}

/// Index of the Hilbert-nearest site; lowest index on ties. `None` when `p` is not
/// strictly inside or there are no sites.
pub fn nearest_site(hull: &Hull, sites: &[Point], p: Point) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for (i, &s) in sites.iter().enumerate() {
        let d = hull.distance(s, p);
        if !d.is_finite() {
            continue;
        }
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, i));
        }
    }
    best.map(|(_, i)| i)
}

/// Sample the nearest-site map of `sites` over `hull`.
pub fn compute_voronoi(hull: &Hull, sites: &[Point], cfg: RasterCfg) -> Result<RasterMap> {
    let (lo, hi) = match hull.bounding_box() {
        Some(b) if !hull.is_degenerate() => b,
        _ => {
            return Err(HilbertError::DegenerateDomain {
                control_points: hull.len(),
            })
        }
    };
    let step = cfg.step.max(1);
    let (x0, x1) = (lo.x.floor() as i64, hi.x.ceil() as i64);
    let (y0, y1) = (lo.y.floor() as i64, hi.y.ceil() as i64);
    let count = |a: i64, b: i64| ((b - a).max(0) as usize).div_ceil(step);
    let (cols, rows) = (count(x0, x1), count(y0, y1));

    let mut map = RasterMap {
        x0,
        y0,
        step,
        cols,
        rows,
        cells: Vec::new(),
    };
    let columns: Vec<Vec<Option<usize>>> = (0..cols)
        .into_par_iter()
        .map(|c| {
            (0..rows)
                .map(|r| {
                    let p = map.position(c, r);
                    if hull.is_interior(p) {
                        nearest_site(hull, sites, p)
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect();
    map.cells = columns.into_iter().flatten().collect();
    tracing::debug!(cols, rows, sites = sites.len(), "raster sampled");
    Ok(map)
}

/// First sample positions along a line through `site` where the raster's site index
/// changes, walking away from the site in both directions.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayHits {
    pub forward: Option<Point>,
    pub backward: Option<Point>,
}

/// Walk `site ± k·step·dir̂` while inside the domain and report the first sample whose
/// nearest-site index (3×3 lookup) differs from the one at `site`.
pub fn ray_trace(map: &RasterMap, hull: &Hull, site: Point, dir: Point) -> RayHits {
    let len = dir.norm();
    let Some(start) = map.index_near(site) else {
        return RayHits::default();
    };
    if len == 0.0 {
        return RayHits::default();
    }
    let u = dir / len * map.step() as f64;
    let walk = |sign: f64| -> Option<Point> {
        let mut k = 1.0;
        loop {
            let p = site + u * (sign * k);
            if !hull.is_interior(p) {
                return None;
            }
            match map.index_near(p) {
                Some(i) if i != start => return Some(p),
                _ => {}
            }
            k += 1.0;
        }
    };
    RayHits {
        forward: walk(1.0),
        backward: walk(-1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom2::GeomCfg;
    use nalgebra::vector;

    fn square() -> Hull {
        Hull::from_points(
            &[
                vector![0.0, 0.0],
                vector![10.0, 0.0],
                vector![10.0, 10.0],
                vector![0.0, 10.0],
            ],
            GeomCfg::default(),
        )
    }

    #[test]
    fn grid_excludes_upper_bound() {
        let map = compute_voronoi(&square(), &[vector![5.0, 5.0]], RasterCfg::default()).unwrap();
        assert_eq!(map.dims(), (5, 5));
        // x = 0 and y = 0 lie on the boundary
        assert_eq!(map.get(0, 3), None);
        assert_eq!(map.get(2, 2), Some(0));
        assert_eq!(map.samples().count(), 16);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let h = square();
        let sites = [vector![3.0, 5.0], vector![7.0, 5.0]];
        assert_eq!(nearest_site(&h, &sites, vector![5.0, 5.0]), Some(0));
        assert_eq!(nearest_site(&h, &sites, vector![6.0, 5.0]), Some(1));
        assert_eq!(nearest_site(&h, &sites, vector![10.0, 5.0]), None);
        assert_eq!(nearest_site(&h, &[], vector![5.0, 5.0]), None);
    }

    #[test]
    fn degenerate_hull_is_an_error() {
        let flat = Hull::from_points(
            &[vector![0.0, 0.0], vector![1.0, 1.0], vector![2.0, 2.0]],
            GeomCfg::default(),
        );
        assert!(matches!(
            compute_voronoi(&flat, &[], RasterCfg::default()),
            Err(HilbertError::DegenerateDomain { .. })
        ));
    }

    #[test]
    fn ray_trace_finds_the_switch() {
        let h = square();
        let sites = [vector![3.0, 5.0], vector![7.0, 5.0]];
        let map = compute_voronoi(&h, &sites, RasterCfg { step: 1 }).unwrap();
        let hits = ray_trace(&map, &h, sites[0], vector![1.0, 0.0]);
        let f = hits.forward.expect("crosses into the other cell");
        assert!((f.x - 6.0).abs() < 1e-12 && (f.y - 5.0).abs() < 1e-12);
        assert!(hits.backward.is_none());
    }
}
