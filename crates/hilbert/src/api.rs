//! Curated API surface.
//!
//! Prefer these re-exports in drivers and benches; module paths may move.

// Domain and metric
pub use crate::geom2::{
    boundary_exits, hilbert_distance, segment_intersection, spoke_angle, theta_rays,
    theta_rays_between, Chord, ConvexDomain, GeomCfg, Hull, Point, Segment,
};
// Random domains and sites
pub use crate::geom2::rand::{
    draw_domain_radial, draw_sites, RadialCfg, ReplayToken as DomainReplay, VertexCount,
};
// Bisectors and raster
pub use crate::voronoi::{
    build_graph, compute_voronoi, find_equidistant_point, nearest_site, ray_trace, Bisector,
    BisectorTracer, EngineSnapshot, RasterCfg, RasterMap, SpokeGraph, TraceCfg, TraceState,
    VoronoiEngine,
};
// Errors and input
pub use crate::error::{HilbertError, Result};
pub use crate::io::{format_control_points, parse_control_points};

use std::sync::Arc;

/// Hull of `control_points` (default tolerances) and the bisector of two sites in it.
pub fn trace_with_defaults(control_points: &[Point], site1: Point, site2: Point) -> Result<Bisector> {
    let domain = ConvexDomain::from_points(control_points.iter().copied(), GeomCfg::default());
    BisectorTracer::new(Arc::clone(domain.hull()), site1, site2, TraceCfg::default())?.trace()
}

/// Same, from count-prefixed control-point text.
pub fn trace_from_text(text: &str, site1: Point, site2: Point) -> Result<Bisector> {
    trace_with_defaults(&parse_control_points(text)?, site1, site2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn text_to_bisector() {
        let b = trace_from_text("4\n0 0\n10 0\n10 10\n0 10\n", vector![3.0, 3.0], vector![7.0, 7.0])
            .unwrap();
        assert_eq!(b.pieces.len(), 2);
        assert!(matches!(
            trace_from_text("4\n0 0", vector![3.0, 3.0], vector![7.0, 7.0]),
            Err(HilbertError::InputParse { .. })
        ));
        assert!(matches!(
            trace_from_text("2\n0 0\n1 1", vector![3.0, 3.0], vector![7.0, 7.0]),
            Err(HilbertError::DegenerateDomain { .. })
        ));
    }

    #[test]
    fn seeded_pairs_are_equidistant_at_their_samples() {
        let mut rng = StdRng::seed_from_u64(2024);
        let hexagon: Vec<Point> = (0..6)
            .map(|k| {
                let th = k as f64 * std::f64::consts::TAU / 6.0;
                vector![50.0 + 40.0 * th.cos(), 50.0 + 40.0 * th.sin()]
            })
            .collect();
        let hull = ConvexDomain::from_points(hexagon.iter().copied(), GeomCfg::default())
            .hull()
            .clone();
        for _ in 0..5 {
            let s1 = vector![rng.gen_range(35.0..65.0), rng.gen_range(35.0..65.0)];
            let s2 = vector![rng.gen_range(35.0..65.0), rng.gen_range(35.0..65.0)];
            let b = trace_with_defaults(&hexagon, s1, s2).unwrap();
            for piece in &b.pieces {
                let inner = piece.points.len().saturating_sub(2);
                for p in piece.points.iter().skip(1).take(inner) {
                    let (d1, d2) = (hull.distance(s1, *p), hull.distance(s2, *p));
                    if d1 < 6.0 {
                        assert!((d1 - d2).abs() <= 1e-6 * (1.0 + d1), "{p:?}: {d1} vs {d2}");
                    }
                }
            }
        }
    }
}
