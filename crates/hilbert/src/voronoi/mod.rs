//! Exact Hilbert bisectors via the spoke-graph sector decomposition.
//!
//! Purpose
//! - `build`: the spoke graph of a site pair (hull edges and site spokes cut at every
//!   intersection).
//! - `sector`: faces of that graph; convex, and on each one both sites have a fixed
//!   pair of front/back hull edges.
//! - `conic`: inside a sector the bisector is a conic; crossings and samples.
//! - `trace`: the sector-to-sector state machine, plus the numeric equidistant-point
//!   search along a spoke.
//! - `raster`: brute-force nearest-site sampling for validation.
//! - `engine`: owner of the site list; immutable snapshots serve queries.
//!
//! Graphs, sectors and bisectors are per-query artifacts bound to one hull snapshot.

pub mod build;
pub mod conic;
pub mod engine;
pub mod raster;
pub mod sector;
pub mod trace;
mod types;

pub use build::{build_graph, site_spokes};
pub use conic::{LineRoots, Quadratic, SectorConic};
pub use engine::{EngineSnapshot, VoronoiEngine};
pub use raster::{compute_voronoi, nearest_site, ray_trace, RasterCfg, RasterMap, RayHits};
pub use sector::{all_sectors, construct_sector, sectors_around};
pub use trace::{find_equidistant_point, BisectorTracer};
pub use types::{
    Bisector, BisectorPiece, GraphNode, NodeId, Sector, SpokeGraph, TraceCfg, TraceState,
};

#[cfg(test)]
mod tests;
