//! Writes a synthetic marathon course as GPX.
//!
//! Run with:
//! ```
//! COURSE_TERRAIN=hilly COURSE_OUT=hilly.gpx cargo run -p test-data --bin gen-course
//! ```
//! and point the predictor at it with `COURSE_GPX=hilly.gpx`.

use predictor::CourseProfile;
use rand::SeedableRng;
use rand::rngs::StdRng;
use test_data::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seed: u32 = std::env::var("COURSE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345);
    let terrain = std::env::var("COURSE_TERRAIN").unwrap_or_else(|_| "london".to_string());
    let out = std::env::var("COURSE_OUT").unwrap_or_else(|_| "course.gpx".to_string());

    let elevation = match terrain.as_str() {
        "london" => ElevationGenerator::london(seed),
        "hilly" => ElevationGenerator::hilly(seed),
        "flat" => ElevationGenerator::flat(seed),
        "rolling" => ElevationGenerator::new(seed),
        other => anyhow::bail!("unknown COURSE_TERRAIN {other:?} (london, hilly, flat, rolling)"),
    };

    let mut rng = StdRng::seed_from_u64(u64::from(seed));
    let points = CourseGenerator::new(seed)
        .with_elevation(elevation)
        .generate(&mut rng);

    let profile = CourseProfile::from_points(&points)?;
    let multipliers = profile.multipliers();
    let slowest = multipliers.iter().cloned().fold(f64::MIN, f64::max);
    let fastest = multipliers.iter().cloned().fold(f64::MAX, f64::min);

    std::fs::write(&out, generate_gpx(&points, &format!("Synthetic {terrain} marathon")))?;

    tracing::info!("Course written to {out}");
    tracing::info!("  Terrain: {terrain} (seed {seed})");
    tracing::info!("  Points: {}", points.len());
    tracing::info!("  Multipliers: {fastest:.4} .. {slowest:.4}");

    Ok(())
}
