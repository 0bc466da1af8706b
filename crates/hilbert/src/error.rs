use thiserror::Error;

/// Errors surfaced by structural failures of the engine.
///
/// Geometric "no answer" outcomes (parallel lines, a point at infinity, a chord that
/// misses the domain) are `Option`s at their call sites and never reach this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HilbertError {
    #[error("degenerate domain: hull needs 3 non-collinear control points, have {control_points}")]
    DegenerateDomain { control_points: usize },

    #[error("point ({x}, {y}) is not strictly inside the domain")]
    PointOutsideDomain { x: f64, y: f64 },

    #[error("bisector sites coincide")]
    CoincidentSites,

    #[error("no site with index {0}")]
    UnknownSite(usize),

    #[error("no sector found around the site pair")]
    NoIntersection,

    #[error("equidistant search exhausted after {divisions} steps (best gap {best_gap})")]
    SearchExhausted { divisions: usize, best_gap: f64 },

    #[error("malformed control-point input at {token:?}: {reason}")]
    InputParse { token: String, reason: String },
}

/// Convenience alias for results using [`HilbertError`].
pub type Result<T> = std::result::Result<T, HilbertError>;
