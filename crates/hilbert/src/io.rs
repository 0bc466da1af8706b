//! Control-point input: a count followed by that many `x y` pairs, whitespace separated.
//!
//! ```text
//! 4
//! 0 0
//! 10 0
//! 10 10
//! 0 10
//! ```
//!
//! Malformed input is an `InputParse` error; nothing is recovered or guessed.

use std::fmt::Write as _;

use crate::error::{HilbertError, Result};
use crate::geom2::Point;

fn parse_error(token: &str, reason: impl Into<String>) -> HilbertError {
    HilbertError::InputParse {
        token: token.to_string(),
        reason: reason.into(),
    }
}

/// Parse a count-prefixed control-point list.
pub fn parse_control_points(text: &str) -> Result<Vec<Point>> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next().ok_or_else(|| parse_error("", "empty input"))?;
    let count: usize = head
        .parse()
        .map_err(|e| parse_error(head, format!("bad point count: {e}")))?;

    let mut coord = |axis: &str| -> Result<f64> {
        let tok = tokens
            .next()
            .ok_or_else(|| parse_error("", format!("expected {count} points, input ended at {axis}")))?;
        let v: f64 = tok
            .parse()
            .map_err(|e| parse_error(tok, format!("bad {axis} coordinate: {e}")))?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(parse_error(tok, format!("non-finite {axis} coordinate")))
        }
    };
    // the count is untrusted; grow as pairs actually arrive
    let mut points = Vec::new();
    for _ in 0..count {
        let x = coord("x")?;
        let y = coord("y")?;
        points.push(Point::new(x, y));
    }
    if let Some(extra) = tokens.next() {
        return Err(parse_error(extra, format!("trailing input after {count} points")));
    }
    Ok(points)
}

/// Inverse of [`parse_control_points`].
pub fn format_control_points(points: &[Point]) -> String {
    let mut out = format!("{}\n", points.len());
    for p in points {
        let _ = writeln!(out, "{} {}", p.x, p.y);
    }
    out
}
