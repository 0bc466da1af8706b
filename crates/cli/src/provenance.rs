//! `<artifact>.provenance.json` sidecars: which query produced a result, with which
//! parameters, on which domain snapshot.

use anyhow::{Context, Result};
use hilbert::api::ConvexDomain;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Identifies the domain a result was computed on.
#[derive(Debug, Serialize)]
pub struct DomainStamp {
    pub input: String,
    pub hull_version: u64,
    pub control_points: usize,
    pub hull_vertices: usize,
    /// FNV-1a over the control points' IEEE bit patterns, as hex. Equal digests mean
    /// bit-identical control points in the same order.
    pub digest: String,
}

impl DomainStamp {
    pub fn of(input: &str, domain: &ConvexDomain) -> Self {
        Self {
            input: input.to_string(),
            hull_version: domain.version(),
            control_points: domain.control_points().len(),
            hull_vertices: domain.hull().len(),
            digest: format!("{:016x}", point_digest(domain.control_points())),
        }
    }
}

fn point_digest(points: &[hilbert::Point]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    points
        .iter()
        .flat_map(|p| [p.x.to_bits(), p.y.to_bits()])
        .flat_map(u64::to_le_bytes)
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

#[derive(Debug, Serialize)]
pub struct Provenance {
    pub query: &'static str,
    pub code_rev: String,
    pub lib_version: &'static str,
    pub domain: DomainStamp,
    pub params: Value,
    pub outputs: Vec<String>,
}

impl Provenance {
    pub fn new(query: &'static str, domain: DomainStamp, params: Value) -> Self {
        Self {
            query,
            code_rev: code_rev(),
            lib_version: hilbert::VERSION,
            domain,
            params,
            outputs: Vec::new(),
        }
    }

    /// Record `artifact` as the output and write the sidecar beside it.
    pub fn write_beside(mut self, artifact: &Path) -> Result<PathBuf> {
        self.outputs.push(artifact.to_string_lossy().into_owned());
        let path = sidecar_path(artifact);
        std::fs::write(&path, serde_json::to_vec_pretty(&self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// `out/bisector.json` → `out/bisector.provenance.json`.
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// `GIT_COMMIT` (build time, then run time), else `git rev-parse HEAD`, else "unknown".
pub fn code_rev() -> String {
    let from_env = option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|s| !s.is_empty());
    if let Some(rev) = from_env {
        return rev;
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilbert::api::GeomCfg;
    use hilbert::Point;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn square() -> ConvexDomain {
        ConvexDomain::from_points(
            [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)].map(|(x, y)| Point::new(x, y)),
            GeomCfg::default(),
        )
    }

    #[test]
    fn sidecar_sits_beside_the_artifact() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/output/bisector.json")),
            Path::new("/tmp/output/bisector.provenance.json")
        );
        assert_eq!(sidecar_path(Path::new("raster")), Path::new("raster.provenance.json"));
    }

    #[test]
    fn stamp_tracks_domain_edits() {
        let mut d = square();
        let before = DomainStamp::of("square.txt", &d);
        assert_eq!(before.control_points, 4);
        assert_eq!(before.hull_vertices, 4);
        assert_eq!(before.digest, DomainStamp::of("copy.txt", &square()).digest);

        d.add_point(Point::new(5.0, 5.0));
        let after = DomainStamp::of("square.txt", &d);
        assert!(after.hull_version > before.hull_version);
        assert_eq!(after.hull_vertices, 4);
        assert_ne!(after.digest, before.digest);
    }

    #[test]
    fn written_sidecar_names_query_domain_and_output() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("raster.json");
        fs::write(&artifact, "{}").unwrap();
        let d = square();
        let prov = Provenance::new("raster", DomainStamp::of("square.txt", &d), json!({"step": 2}));
        let path = prov.write_beside(&artifact).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["query"], "raster");
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["domain"]["input"], "square.txt");
        assert_eq!(parsed["domain"]["hull_version"], d.version());
        assert_eq!(parsed["params"]["step"], 2);
        assert_eq!(parsed["lib_version"], hilbert::VERSION);
    }
}
