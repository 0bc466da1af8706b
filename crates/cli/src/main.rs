use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hilbert::api::{
    compute_voronoi, find_equidistant_point, parse_control_points, BisectorTracer, ConvexDomain,
    GeomCfg, Point, RasterCfg, TraceCfg,
};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

use provenance::{DomainStamp, Provenance};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Headless Hilbert-metric hull, distance, bisector and raster queries")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Args, Clone)]
struct Domain {
    /// Control-point file: a count, then that many `x y` pairs
    #[arg(long)]
    input: String,
}

#[derive(Subcommand)]
enum Action {
    /// Print the hull of the control points
    Hull {
        #[command(flatten)]
        domain: Domain,
    },
    /// Hilbert distance between two points
    Distance {
        #[command(flatten)]
        domain: Domain,
        #[arg(long, value_parser = parse_point)]
        p: Point,
        #[arg(long, value_parser = parse_point)]
        q: Point,
    },
    /// Trace the exact bisector of two sites
    Bisector {
        #[command(flatten)]
        domain: Domain,
        #[arg(long, value_parser = parse_point)]
        site1: Point,
        #[arg(long, value_parser = parse_point)]
        site2: Point,
        /// Interior samples per sector piece
        #[arg(long, default_value_t = 16)]
        samples: usize,
        /// Cap on sector transitions (default: number of sectors)
        #[arg(long)]
        max_transitions: Option<usize>,
        /// Write JSON here (plus a provenance sidecar) instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
    /// Numeric equidistant point on the spoke from site1 through `toward`
    Equidistant {
        #[command(flatten)]
        domain: Domain,
        #[arg(long, value_parser = parse_point)]
        site1: Point,
        #[arg(long, value_parser = parse_point)]
        site2: Point,
        #[arg(long, value_parser = parse_point)]
        toward: Point,
        #[arg(long, default_value_t = 1000)]
        divisions: usize,
    },
    /// Nearest-site raster over the domain
    Raster {
        #[command(flatten)]
        domain: Domain,
        /// Site as `x,y`; repeat for more sites
        #[arg(long = "site", value_parser = parse_point, required = true)]
        sites: Vec<Point>,
        #[arg(long, default_value_t = 2)]
        step: usize,
        #[arg(long)]
        out: Option<String>,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Hull { domain } => hull(&domain),
        Action::Distance { domain, p, q } => distance(&domain, p, q),
        Action::Bisector {
            domain,
            site1,
            site2,
            samples,
            max_transitions,
            out,
        } => {
            let cfg = TraceCfg {
                samples_per_sector: samples,
                max_transitions,
                ..TraceCfg::default()
            };
            bisector(&domain, site1, site2, cfg, out.as_deref())
        }
        Action::Equidistant {
            domain,
            site1,
            site2,
            toward,
            divisions,
        } => equidistant(&domain, site1, site2, toward, divisions),
        Action::Raster {
            domain,
            sites,
            step,
            out,
        } => raster(&domain, &sites, step, out.as_deref()),
        Action::Report => report(),
    }
}

/// `x,y` → point.
fn parse_point(s: &str) -> std::result::Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(Point::new(x, y))
}

fn load(domain: &Domain) -> Result<ConvexDomain> {
    let text = std::fs::read_to_string(&domain.input)
        .with_context(|| format!("reading {}", domain.input))?;
    let points =
        parse_control_points(&text).with_context(|| format!("parsing {}", domain.input))?;
    let d = ConvexDomain::from_points(points, GeomCfg::default());
    tracing::info!(
        input = %domain.input,
        control_points = d.control_points().len(),
        hull_vertices = d.hull().len(),
        "domain loaded"
    );
    Ok(d)
}

fn xy(p: Point) -> [f64; 2] {
    [p.x, p.y]
}

/// Print `value`, or write it to `out` with a provenance sidecar.
fn emit<T: Serialize>(value: &T, out: Option<&str>, prov: Option<Provenance>) -> Result<()> {
    let Some(out) = out else {
        println!("{}", serde_json::to_string_pretty(value)?);
        return Ok(());
    };
    let out_path = Path::new(out);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out_path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {out}"))?;
    match prov {
        Some(prov) => {
            let sidecar = prov.write_beside(out_path)?;
            tracing::info!(out = %out, provenance = %sidecar.display(), "wrote");
        }
        None => tracing::info!(out = %out, "wrote"),
    }
    Ok(())
}

#[derive(Serialize)]
struct HullOut {
    version: u64,
    degenerate: bool,
    vertices: Vec<[f64; 2]>,
}

fn hull(domain: &Domain) -> Result<()> {
    let d = load(domain)?;
    let h = d.hull();
    let out = HullOut {
        version: h.version(),
        degenerate: h.is_degenerate(),
        vertices: h.vertices().iter().copied().map(xy).collect(),
    };
    emit(&out, None, None)
}

fn distance(domain: &Domain, p: Point, q: Point) -> Result<()> {
    let d = load(domain)?;
    let dist = d.hull().distance(p, q);
    tracing::info!(?p, ?q, dist, "distance");
    // JSON has no infinity
    let value = if dist.is_finite() { json!(dist) } else { json!(dist.to_string()) };
    emit(&json!({ "p": xy(p), "q": xy(q), "distance": value }), None, None)
}

#[derive(Serialize)]
struct BisectorOut {
    site1: [f64; 2],
    site2: [f64; 2],
    transitions: usize,
    sector_count: usize,
    pieces: Vec<Vec<[f64; 2]>>,
    polyline: Vec<[f64; 2]>,
}

fn bisector(domain: &Domain, site1: Point, site2: Point, cfg: TraceCfg, out: Option<&str>) -> Result<()> {
    tracing::info!(?site1, ?site2, samples = cfg.samples_per_sector, max_transitions = ?cfg.max_transitions, "bisector");
    let d = load(domain)?;
    let b = BisectorTracer::new(Arc::clone(d.hull()), site1, site2, cfg)
        .and_then(|t| t.trace())
        .context("tracing bisector")?;
    let result = BisectorOut {
        site1: xy(site1),
        site2: xy(site2),
        transitions: b.transitions,
        sector_count: b.sector_count,
        pieces: b
            .pieces
            .iter()
            .map(|p| p.points.iter().copied().map(xy).collect())
            .collect(),
        polyline: b.polyline().into_iter().map(xy).collect(),
    };
    let prov = Provenance::new(
        "bisector",
        DomainStamp::of(&domain.input, &d),
        json!({
            "site1": xy(site1),
            "site2": xy(site2),
            "samples_per_sector": cfg.samples_per_sector,
            "max_transitions": cfg.max_transitions,
        }),
    );
    emit(&result, out, Some(prov))
}

fn equidistant(domain: &Domain, site1: Point, site2: Point, toward: Point, divisions: usize) -> Result<()> {
    tracing::info!(?site1, ?site2, ?toward, divisions, "equidistant");
    let d = load(domain)?;
    let cfg = TraceCfg {
        search_divisions: divisions,
        ..TraceCfg::default()
    };
    let p = find_equidistant_point(d.hull(), site1, site2, toward, &cfg)
        .context("equidistant search")?;
    emit(&json!({ "point": xy(p) }), None, None)
}

#[derive(Serialize)]
struct RasterOut {
    step: usize,
    cols: usize,
    rows: usize,
    sites: Vec<[f64; 2]>,
    /// `[x, y, site]` per interior sample
    samples: Vec<(f64, f64, usize)>,
}

fn raster(domain: &Domain, sites: &[Point], step: usize, out: Option<&str>) -> Result<()> {
    tracing::info!(sites = sites.len(), step, "raster");
    if step == 0 {
        bail!("--step must be positive");
    }
    let d = load(domain)?;
    let map = compute_voronoi(d.hull(), sites, RasterCfg { step })?;
    let (cols, rows) = map.dims();
    let result = RasterOut {
        step,
        cols,
        rows,
        sites: sites.iter().copied().map(xy).collect(),
        samples: map.samples().map(|(p, i)| (p.x, p.y, i)).collect(),
    };
    let prov = Provenance::new(
        "raster",
        DomainStamp::of(&domain.input, &d),
        json!({ "step": step, "sites": result.sites }),
    );
    emit(&result, out, Some(prov))
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::code_rev(),
        "lib_version": hilbert::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    fn square_file(dir: &Path) -> Domain {
        let input = dir.join("square.txt");
        fs::write(&input, "4\n0 0\n10 0\n10 10\n0 10\n").unwrap();
        Domain {
            input: input.to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn point_arguments() {
        assert_eq!(parse_point("3, 4.5").unwrap(), Point::new(3.0, 4.5));
        assert!(parse_point("3").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn bisector_writes_json_and_sidecar() {
        let dir = tempdir().unwrap();
        let domain = square_file(dir.path());
        let out = dir.path().join("out/bisector.json");
        let out_str = out.to_string_lossy().into_owned();
        bisector(
            &domain,
            Point::new(3.0, 3.0),
            Point::new(7.0, 7.0),
            TraceCfg::default(),
            Some(&out_str),
        )
        .unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(parsed["transitions"], 1);
        assert_eq!(parsed["pieces"].as_array().unwrap().len(), 2);
        let sidecar: Value =
            serde_json::from_slice(&fs::read(dir.path().join("out/bisector.provenance.json")).unwrap())
                .unwrap();
        assert_eq!(sidecar["query"], "bisector");
        assert_eq!(sidecar["domain"]["control_points"], 4);
    }

    #[test]
    fn raster_and_bad_input() {
        let dir = tempdir().unwrap();
        let domain = square_file(dir.path());
        let out = dir.path().join("raster.json");
        let out_str = out.to_string_lossy().into_owned();
        raster(&domain, &[Point::new(5.0, 5.0)], 2, Some(&out_str)).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(parsed["samples"].as_array().unwrap().len(), 16);

        let bad = dir.path().join("bad.txt");
        fs::write(&bad, "3\n0 0\n1").unwrap();
        let bad = Domain {
            input: bad.to_string_lossy().into_owned(),
        };
        assert!(load(&bad).is_err());
        assert!(raster(&domain, &[Point::new(5.0, 5.0)], 0, None).is_err());
    }
}
