//! Hilbert-metric geometry over a convex planar domain.
//!
//! - `geom2`: convex domain, hull snapshots, projective helpers, the Hilbert metric.
//! - `voronoi`: exact bisectors by sector-to-sector tracing, a brute-force raster for
//!   validation, and the site-owning engine.
//! - `io`: count-prefixed control-point input.
//!
//! Geometric "no answer" results are `Option`s; structural failures are
//! [`HilbertError`]s. The library logs through `tracing` and installs no subscriber.

pub mod api;
pub mod error;
pub mod geom2;
pub mod io;
pub mod voronoi;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{HilbertError, Result};
pub use geom2::{GeomCfg, Point};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::error::{HilbertError, Result};
    pub use crate::geom2::{ConvexDomain, GeomCfg, Hull, Point, Segment};
    pub use crate::voronoi::{
        Bisector, BisectorTracer, EngineSnapshot, RasterCfg, RasterMap, TraceCfg, VoronoiEngine,
    };
    pub use nalgebra::Vector2 as Vec2;
}
