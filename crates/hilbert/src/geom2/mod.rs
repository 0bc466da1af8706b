//! Planar geometry of the convex domain.
//!
//! Purpose
//! - Projective primitives (homogeneous points and lines, meets and joins).
//! - The convex domain: control points, immutable hull snapshots and their
//!   containment / boundary / chord predicates.
//! - The Hilbert metric over a hull.
//!
//! Tolerances live in `GeomCfg`; see its field docs for which predicate uses which.

pub mod hull;
pub mod metric;
pub mod projective;
pub mod rand;
mod types;

pub use hull::{Chord, ConvexDomain, Hull};
pub use metric::{boundary_exits, hilbert_distance};
pub use projective::{
    cross, eval_line, intersect_lines, line_through, segment_intersection, spoke_angle,
    theta_rays, theta_rays_between, to_cartesian, to_homogeneous, Homogeneous,
};
pub use types::{cross2, orient, GeomCfg, Point, Segment};
