//! Random convex domains and interior sites (radial jitter + replay tokens).
//!
//! Model
//! - Start from `n` equally spaced angles on [0, 2π), add bounded angular and radial
//!   jitter around a center, and hand the points to `ConvexDomain::from_points`.
//! - Sites are drawn by rejection inside the hull, kept a relative margin away from
//!   the boundary so Hilbert distances stay well conditioned.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::hull::{ConvexDomain, Hull};
use super::types::{GeomCfg, Point};

/// Vertex count distribution.
#[derive(Clone, Copy, Debug)]
pub enum VertexCount {
    Fixed(usize),
    Uniform { min: usize, max: usize },
}

impl VertexCount {
    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        match *self {
            VertexCount::Fixed(n) => n.max(3),
            VertexCount::Uniform { min, max } => {
                let lo = min.max(3);
                let hi = max.max(lo);
                rng.gen_range(lo..=hi)
            }
        }
    }
}

/// Radial-jitter sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct RadialCfg {
    pub vertex_count: VertexCount,
    /// Angular jitter as a fraction of the base spacing Δ=2π/n. Clamped to [0, 0.49].
    pub angle_jitter_frac: f64,
    /// Radii = `radius * (1 + u)`, with `u∈[-radial_jitter, radial_jitter]`.
    pub radial_jitter: f64,
    pub radius: f64,
    pub center: Point,
}

impl Default for RadialCfg {
    fn default() -> Self {
        Self {
            vertex_count: VertexCount::Fixed(8),
            angle_jitter_frac: 0.3,
            radial_jitter: 0.25,
            radius: 50.0,
            center: Vector2::new(50.0, 50.0),
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Draw a random convex domain. `None` if the draw collapsed to a degenerate hull.
pub fn draw_domain_radial(cfg: RadialCfg, tok: ReplayToken) -> Option<ConvexDomain> {
    let mut rng = tok.to_std_rng();
    let n = cfg.vertex_count.sample(&mut rng);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.49);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let r0 = cfg.radius.max(1e-9);
    let delta = std::f64::consts::TAU / (n as f64);
    let phase = rng.gen::<f64>() * std::f64::consts::TAU;
    let pts: Vec<Point> = (0..n)
        .map(|k| {
            let th = phase + (k as f64) * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let r = (1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * rj) * r0;
            cfg.center + Vector2::new(th.cos() * r, th.sin() * r)
        })
        .collect();
    let domain = ConvexDomain::from_points(pts, GeomCfg::default());
    if domain.hull().is_degenerate() {
        None
    } else {
        Some(domain)
    }
}

/// Draw `count` sites strictly inside `hull`, at least `margin` (relative to the
/// hull's bounding-box size) away from every edge.
pub fn draw_sites(hull: &Hull, count: usize, margin: f64, tok: ReplayToken) -> Vec<Point> {
    let Some((lo, hi)) = hull.bounding_box() else {
        return Vec::new();
    };
    if hull.is_degenerate() {
        return Vec::new();
    }
    let mut rng = tok.to_std_rng();
    let slack = -(margin.max(0.0) * (hi - lo).norm());
    let mut out = Vec::with_capacity(count);
    // rejection sampling; bounded so thin hulls cannot spin forever
    for _ in 0..count.saturating_mul(1000) {
        if out.len() == count {
            break;
        }
        let p = Vector2::new(rng.gen_range(lo.x..=hi.x), rng.gen_range(lo.y..=hi.y));
        if hull.contains_eps(p, slack) {
            out.push(p);
        }
    }
    out
}
