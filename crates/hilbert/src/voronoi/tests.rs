use std::sync::Arc;

use nalgebra::vector;
use proptest::prelude::*;

use super::*;
use crate::error::HilbertError;
use crate::geom2::rand::{draw_domain_radial, draw_sites, RadialCfg, ReplayToken};
use crate::geom2::{orient, ConvexDomain, GeomCfg, Hull, Point};

fn square() -> Arc<Hull> {
    Arc::new(Hull::from_points(
        &[
            vector![0.0, 0.0],
            vector![10.0, 0.0],
            vector![10.0, 10.0],
            vector![0.0, 10.0],
        ],
        GeomCfg::default(),
    ))
}

fn triangle() -> Arc<Hull> {
    Arc::new(Hull::from_points(
        &[vector![0.0, 0.0], vector![10.0, 0.0], vector![3.0, 8.0]],
        GeomCfg::default(),
    ))
}

fn trace_pair(h: &Arc<Hull>, s1: Point, s2: Point) -> Bisector {
    BisectorTracer::new(h.clone(), s1, s2, TraceCfg::default())
        .unwrap()
        .trace()
        .unwrap()
}

/// Both ends on the hull at the expected points, every interior sample equidistant.
fn assert_bisector(h: &Hull, b: &Bisector, s1: Point, s2: Point, ends: [Point; 2]) {
    assert!(b.transitions <= b.sector_count);
    let (first, last) = b.endpoints().unwrap();
    assert!(h.is_on_convex_boundary(first), "{first:?} not on the boundary");
    assert!(h.is_on_convex_boundary(last), "{last:?} not on the boundary");
    for e in ends {
        assert!(close(first, e, 1e-6) || close(last, e, 1e-6), "no end at {e:?}");
    }
    for p in b.polyline() {
        if h.is_interior(p) {
            let (d1, d2) = (h.distance(s1, p), h.distance(s2, p));
            assert!((d1 - d2).abs() <= 1e-6 * (1.0 + d1), "{p:?}: {d1} vs {d2}");
        }
    }
}

fn close(p: Point, q: Point, tol: f64) -> bool {
    (p - q).norm() <= tol
}

#[test]
fn duplicate_insert_merges_into_one_node() {
    let mut g = SpokeGraph::new(square(), vector![3.0, 3.0], vector![7.0, 7.0], GeomCfg::default());
    let a = g.insert_point(vector![1.0, 1.0]);
    let a2 = g.insert_point(vector![1.0 + 1e-14, 1.0]);
    assert_eq!(a, a2);
    assert_eq!(g.len(), 1);
    let b = g.insert_point(vector![2.0, 1.0]);
    let c = g.insert_point(vector![1.0, 2.0]);
    g.add_edge(a, b);
    g.add_edge(a2, c);
    g.add_edge(b, a);
    g.add_edge(c, c);
    assert_eq!(g.neighbors(a), &[b, c]);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.find_node(vector![1.0, 2.0]), Some(c));
    assert_eq!(g.find_node(vector![1.0, 3.0]), None);
}

#[test]
fn spokes_include_backward_extensions() {
    let h = square();
    let spokes = site_spokes(&h, vector![3.0, 3.0]);
    // four vertices; the extensions through (0,0) and (10,10) repeat existing spokes
    assert_eq!(spokes.len(), 6);
    let cfg = GeomCfg::default();
    let ext = crate::geom2::Segment::new(vector![3.0, 3.0], vector![0.0, 30.0 / 7.0]);
    assert!(spokes.iter().any(|s| s.same_as(&ext, &cfg)));
}

#[test]
fn sectors_tile_the_domain() {
    let h = square();
    let g = build_graph(&h, vector![3.0, 3.0], vector![7.0, 7.0], GeomCfg::default());
    for n in g.nodes() {
        assert!(h.contains_eps(n.point, 1e-8));
        assert!(n.neighbors.len() >= 2);
    }
    let sectors = all_sectors(&g);
    let total: f64 = sectors.iter().map(|s| s.area2()).sum();
    assert!((total - h.area2()).abs() < 1e-6, "sectors cover {total} of {}", h.area2());
    for s in &sectors {
        let v = s.vertices();
        let n = v.len();
        for i in 0..n {
            assert!(orient(v[i], v[(i + 1) % n], v[(i + 2) % n]) > -1e-9, "sector not convex");
        }
        assert!(s.contains(s.centroid()));
    }
}

#[test]
fn construct_sector_returns_both_sides_of_an_edge() {
    let (s1, s2) = (vector![3.0, 3.0], vector![7.0, 7.0]);
    let g = build_graph(&square(), s1, s2, GeomCfg::default());
    let a = g.find_node(s1).unwrap();
    let b = g.find_node(s2).unwrap();
    assert!(g.neighbors(a).contains(&b));
    let sectors = construct_sector(&g, a, b);
    assert_eq!(sectors.len(), 2);
    let centroids: Vec<Point> = sectors.iter().map(|s| s.centroid()).collect();
    let upper = vector![10.0 / 3.0, 20.0 / 3.0];
    let lower = vector![20.0 / 3.0, 10.0 / 3.0];
    assert!(centroids.iter().any(|c| close(*c, upper, 1e-9)));
    assert!(centroids.iter().any(|c| close(*c, lower, 1e-9)));
    for s in &sectors {
        assert_eq!(s.nodes().len(), 3);
        assert!(s.has_edge(a, b));
    }
    // around the midpoint of that edge: the same two sectors
    assert_eq!(sectors_around(&g, vector![5.0, 5.0]).len(), 2);
}

#[test]
fn square_bisector_is_the_antidiagonal() {
    // Both sectors along the site segment give Q ∝ x + y - 10, so the bisector runs
    // from (0,10) to (10,0) through (5,5).
    let h = square();
    let (s1, s2) = (vector![3.0, 3.0], vector![7.0, 7.0]);
    let b = BisectorTracer::new(h.clone(), s1, s2, TraceCfg::default())
        .unwrap()
        .trace()
        .unwrap();
    assert_eq!(b.transitions, 1);
    assert_eq!(b.pieces.len(), 2);
    assert!(b.transitions <= b.sector_count);

    let (first, last) = b.endpoints().unwrap();
    let ends = [vector![0.0, 10.0], vector![10.0, 0.0]];
    assert!(ends.iter().any(|e| close(first, *e, 1e-9)));
    assert!(ends.iter().any(|e| close(last, *e, 1e-9)));
    assert!(!close(first, last, 1.0));
    assert!(h.is_on_convex_boundary(first) && h.is_on_convex_boundary(last));

    let line = b.polyline();
    assert!(line.len() > 10);
    assert!(line.iter().any(|p| close(*p, vector![5.0, 5.0], 1e-9)));
    for p in &line {
        assert!((p.x + p.y - 10.0).abs() < 1e-9, "{p:?} off the antidiagonal");
        if h.is_interior(*p) {
            assert!((h.distance(s1, *p) - h.distance(s2, *p)).abs() < 1e-9);
        }
    }
}

#[test]
fn equidistant_sectors_are_flagged_degenerate() {
    // sites on the line x = 3 through the apex (3,8)
    let h = triangle();
    let cfg = GeomCfg::default();
    let (s1, s2) = (vector![3.0, 3.0], vector![3.0, 7.0]);
    let g = build_graph(&h, s1, s2, cfg);
    let sectors = all_sectors(&g);
    let at = |p: Point| sectors.iter().find(|s| s.contains(p)).unwrap();

    let flat = at(vector![6.78, 3.44]);
    assert!(SectorConic::new(&h, flat).unwrap().is_degenerate(&cfg));
    let c = flat.centroid();
    assert!((h.distance(s1, c) - h.distance(s2, c)).abs() < 1e-9);

    let below = at(vector![5.0, 1.0]);
    assert!(!SectorConic::new(&h, below).unwrap().is_degenerate(&cfg));
}

#[test]
fn sites_on_a_spoke_line_trace_to_the_boundary() {
    // The walk reaches (5,5), where the sector ahead is equidistant throughout and the
    // curve shows no sign change; it must still continue to the corner (10,0).
    let h = triangle();
    let (s1, s2) = (vector![3.0, 3.0], vector![3.0, 7.0]);
    let b = trace_pair(&h, s1, s2);
    assert_bisector(&h, &b, s1, s2, [vector![18.0 / 13.0, 48.0 / 13.0], vector![10.0, 0.0]]);
    assert!(b.polyline().iter().any(|p| close(*p, vector![5.0, 5.0], 1e-9)));

    let (s1, s2) = (vector![9.0, 1.0], vector![5.0, 5.0]);
    let b = trace_pair(&h, s1, s2);
    assert_bisector(&h, &b, s1, s2, [vector![25.0 / 3.0, 0.0], vector![3.0, 8.0]]);
}

#[test]
fn crossing_next_to_a_corner_ends_on_the_corner() {
    let h = square();
    let (s1, s2) = (vector![6.0, 4.0], vector![5.0, 7.0]);
    let b = trace_pair(&h, s1, s2);
    assert_bisector(&h, &b, s1, s2, [vector![0.0, 0.0], vector![10.0, 10.0]]);
    let (first, last) = b.endpoints().unwrap();
    // snapped exactly
    assert!([first, last].contains(&vector![10.0, 10.0]));
    assert!(b.pieces.len() >= 3);
}

#[test]
fn step_walks_the_state_machine() {
    let mut t = BisectorTracer::new(square(), vector![3.0, 3.0], vector![7.0, 7.0], TraceCfg::default())
        .unwrap();
    assert_eq!(t.state(), TraceState::Init);
    assert!(t.graph().is_none());
    assert_eq!(t.step().unwrap(), TraceState::InSector);
    assert!(t.graph().is_some());
    assert!(t.current_sector().is_some());
    let mut steps = 1;
    while t.step().unwrap() != TraceState::Done {
        steps += 1;
        assert!(steps < 20);
    }
    // terminal
    assert_eq!(t.step().unwrap(), TraceState::Done);
    assert_eq!(t.transitions(), 1);
    let b = t.finish().unwrap();
    assert_eq!(b.pieces.len(), 2);
}

#[test]
fn transition_budget_caps_the_walk() {
    let cfg = TraceCfg {
        max_transitions: Some(0),
        ..TraceCfg::default()
    };
    let b = BisectorTracer::new(square(), vector![3.0, 3.0], vector![7.0, 7.0], cfg)
        .unwrap()
        .trace()
        .unwrap();
    assert_eq!(b.transitions, 0);
    assert_eq!(b.pieces.len(), 1);
}

#[test]
fn tracer_rejects_bad_queries() {
    let h = square();
    let cfg = TraceCfg::default();
    let p = vector![3.0, 3.0];
    assert!(matches!(
        BisectorTracer::new(h.clone(), p, p, cfg),
        Err(HilbertError::CoincidentSites)
    ));
    assert!(matches!(
        BisectorTracer::new(h.clone(), p, vector![12.0, 3.0], cfg),
        Err(HilbertError::PointOutsideDomain { .. })
    ));
    assert!(matches!(
        BisectorTracer::new(h, p, vector![10.0, 3.0], cfg),
        Err(HilbertError::PointOutsideDomain { .. })
    ));
    let flat = Arc::new(Hull::from_points(
        &[vector![0.0, 0.0], vector![1.0, 1.0], vector![2.0, 2.0]],
        GeomCfg::default(),
    ));
    assert!(matches!(
        BisectorTracer::new(flat, p, vector![1.0, 1.0], cfg),
        Err(HilbertError::DegenerateDomain { control_points: 3 })
    ));
}

#[test]
fn equidistant_search_on_the_diagonal() {
    let h = square();
    let cfg = TraceCfg::default();
    let (s1, s2) = (vector![3.0, 3.0], vector![7.0, 7.0]);
    let p = find_equidistant_point(&h, s1, s2, vector![10.0, 10.0], &cfg).unwrap();
    assert!(close(p, vector![5.0, 5.0], 0.01), "{p:?}");
    assert!((h.distance(s1, p) - h.distance(s2, p)).abs() <= 1e-3);
    // a spoke pointing away from site2 is flipped toward it
    let q = find_equidistant_point(&h, s1, s2, vector![0.0, 0.0], &cfg).unwrap();
    assert!(close(p, q, 1e-12));

    let coarse = TraceCfg {
        search_divisions: 3,
        ..cfg
    };
    match find_equidistant_point(&h, s1, s2, vector![10.0, 10.0], &coarse) {
        Err(HilbertError::SearchExhausted { divisions, best_gap }) => {
            assert_eq!(divisions, 3);
            assert!(best_gap > 1e-3 && best_gap.is_finite());
        }
        other => panic!("expected SearchExhausted, got {other:?}"),
    }
}

#[test]
fn single_site_raster_maps_everything_to_zero() {
    let mut engine = VoronoiEngine::new(ConvexDomain::from_points(
        square().vertices().to_vec(),
        GeomCfg::default(),
    ));
    engine.add_site(vector![4.0, 6.0]);
    let map = engine.compute_voronoi().unwrap();
    assert!(map.samples().count() > 0);
    assert!(map.samples().all(|(_, i)| i == 0));
    // boundary samples are infinitely far from every site and stay unassigned
    assert_eq!(map.dims(), (5, 5));
    assert_eq!(map.position(0, 2), vector![0.0, 4.0]);
    assert_eq!(map.get(0, 2), None);
    assert_eq!(map.get(3, 0), None);
    assert_eq!(map.get(1, 1), Some(0));
    assert_eq!(map.samples().count(), 16);
}

#[test]
fn raster_ray_agrees_with_traced_bisector() {
    let h = square();
    let sites = [vector![3.0, 3.0], vector![7.0, 7.0]];
    let map = compute_voronoi(&h, &sites, RasterCfg { step: 1 }).unwrap();
    let hits = ray_trace(&map, &h, sites[0], vector![1.0, 1.0]);
    let hit = hits.forward.expect("ray reaches the other cell");
    assert!((hit.x + hit.y - 10.0).abs() <= 2.0, "{hit:?}");
    assert!(hits.backward.is_none());
    for (p, i) in map.samples() {
        let side = p.x + p.y - 10.0;
        if side.abs() > 1.0 {
            assert_eq!(i, usize::from(side > 0.0), "{p:?}");
        }
    }
}

#[test]
fn engine_sites_and_snapshots() {
    let mut engine = VoronoiEngine::new(ConvexDomain::from_points(
        square().vertices().to_vec(),
        GeomCfg::default(),
    ));
    assert_eq!(engine.add_site(vector![3.0, 3.0]), 0);
    assert_eq!(engine.add_site(vector![7.0, 7.0]), 1);
    assert_eq!(engine.add_site(vector![2.0, 8.0]), 2);
    assert_eq!(engine.find_site(vector![7.0, 7.0]), Some(1));
    assert_eq!(engine.get_site(5), None);
    assert_eq!(engine.nearest_site(vector![6.0, 6.5]), Some(1));

    let snap = engine.snapshot();
    assert!(engine.move_site(2, vector![8.0, 2.0]));
    assert!(engine.remove_site(vector![3.0, 3.0]));
    assert_eq!(snap.sites().len(), 3);
    assert_eq!(snap.sites()[2], vector![2.0, 8.0]);
    assert_eq!(engine.sites(), &[vector![7.0, 7.0], vector![8.0, 2.0]]);

    let all = snap.trace_all_pairs();
    let pairs: Vec<(usize, usize)> = all.iter().map(|(i, j, _)| (*i, *j)).collect();
    assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    assert!(all.iter().all(|(_, _, r)| r.is_ok()));

    assert!(matches!(snap.trace_bisector(0, 9), Err(HilbertError::UnknownSite(9))));
    assert!(engine.build_cell_map().is_none());

    let v = snap.version();
    engine.add_control_point(vector![15.0, 5.0]);
    assert_eq!(snap.version(), v);
    assert!(engine.snapshot().version() > v);

    engine.reset_sites();
    assert!(engine.sites().is_empty());

    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EngineSnapshot>();
}

#[test]
fn seeded_domains_trace_boundary_to_boundary() {
    for index in 0..6 {
        let domain = draw_domain_radial(RadialCfg::default(), ReplayToken { seed: 11, index })
            .expect("domain");
        let hull = domain.hull().clone();
        let sites = draw_sites(&hull, 2, 0.05, ReplayToken { seed: 12, index });
        let b = BisectorTracer::new(hull.clone(), sites[0], sites[1], TraceCfg::default())
            .unwrap()
            .trace()
            .unwrap();
        let (first, last) = b.endpoints().unwrap();
        assert!(hull.is_on_convex_boundary(first), "index {index}: {first:?}");
        assert!(hull.is_on_convex_boundary(last), "index {index}: {last:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn tracer_terminates_within_sector_budget(seed in any::<u64>(), index in 0u64..1000) {
        let Some(domain) = draw_domain_radial(RadialCfg::default(), ReplayToken { seed, index }) else {
            return Ok(());
        };
        let hull = domain.hull().clone();
        let sites = draw_sites(&hull, 2, 0.05, ReplayToken { seed: seed ^ 1, index });
        prop_assume!(sites.len() == 2);
        prop_assume!((sites[0] - sites[1]).norm() > 1e-3);
        let b = BisectorTracer::new(hull.clone(), sites[0], sites[1], TraceCfg::default())
            .unwrap()
            .trace()
            .unwrap();
        prop_assert!(b.transitions <= b.sector_count);
        for piece in &b.pieces {
            let n = piece.points.len();
            for p in piece.points.iter().take(n.saturating_sub(1)).skip(1) {
                let d1 = hull.distance(sites[0], *p);
                let d2 = hull.distance(sites[1], *p);
                if d1 < 6.0 {
                    prop_assert!((d1 - d2).abs() <= 1e-6 * (1.0 + d1), "{:?}: {} vs {}", p, d1, d2);
                }
            }
        }
    }
}
