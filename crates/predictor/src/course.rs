//! Course profiles: per-kilometre terrain pace multipliers.
//!
//! A profile is either the hand-tuned London vector or derived from a
//! recorded track by summing elevation gain and loss inside each kilometre.

use std::{fs::File, io::BufReader, path::Path};

use geo::{Distance as _, Haversine, geometry::Point};
use gpx::Gpx;

use crate::errors::AppError;

/// Number of whole kilometres simulated.
pub const COURSE_KM: usize = 42;

/// Pace cost per metre climbed within a kilometre.
pub const GAIN_FACTOR: f64 = 0.00033;
/// Pace saving per metre descended within a kilometre.
pub const LOSS_FACTOR: f64 = 0.00018;

/// Validated sequence of 42 positive multipliers, index 0 = kilometre 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseProfile {
    multipliers: [f64; COURSE_KM],
}

impl CourseProfile {
    pub fn new(multipliers: &[f64]) -> Result<Self, AppError> {
        let multipliers: [f64; COURSE_KM] = multipliers.try_into().map_err(|_| {
            AppError::invalid(format!(
                "course profile must have exactly {COURSE_KM} entries, got {}",
                multipliers.len()
            ))
        })?;

        if let Some((km, m)) = multipliers
            .iter()
            .enumerate()
            .find(|(_, m)| !m.is_finite() || **m <= 0.0)
        {
            return Err(AppError::invalid(format!(
                "course multiplier for km {} must be positive, got {m}",
                km + 1
            )));
        }

        Ok(Self { multipliers })
    }

    /// Hand-tuned London profile.
    pub fn london() -> Self {
        let mut multipliers = [1.0; COURSE_KM];
        // Opening 5 km
        for m in &mut multipliers[0..5] {
            *m *= 1.002;
        }
        // Tower Bridge climb
        for m in &mut multipliers[20..25] {
            *m *= 1.002;
        }
        // Embankment, late-race segment
        for m in &mut multipliers[35..40] {
            *m *= 1.003;
        }
        Self { multipliers }
    }

    /// Flat course, every kilometre at 1.0.
    pub fn flat() -> Self {
        Self {
            multipliers: [1.0; COURSE_KM],
        }
    }

    /// Derives a profile from a parsed GPX document.
    pub fn from_gpx(gpx: &Gpx) -> Result<Self, AppError> {
        let points: Vec<CoursePoint> = gpx
            .tracks
            .iter()
            .flat_map(|t| &t.segments)
            .flat_map(|s| &s.points)
            .map(|p| CoursePoint {
                lat: p.point().y(),
                lon: p.point().x(),
                elevation: p.elevation,
            })
            .collect();

        Self::from_points(&points)
    }

    /// Reads and parses a GPX file from disk.
    pub fn from_gpx_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let file = File::open(path.as_ref())?;
        let gpx = gpx::read(BufReader::new(file))
            .map_err(|e| AppError::GpxParsing(format!("Failed to parse GPX: {e}")))?;
        Self::from_gpx(&gpx)
    }

    /// Derives a profile from an ordered list of trackpoints.
    ///
    /// Missing elevations are treated as 0 m. Kilometres past the end of a
    /// short track see no elevation change and get a multiplier of 1.0.
    pub fn from_points(points: &[CoursePoint]) -> Result<Self, AppError> {
        if points.len() < 2 {
            return Err(AppError::GpxParsing(
                "course track needs at least two points".to_string(),
            ));
        }

        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        let mut prev: Option<Point> = None;
        for p in points {
            let here = Point::new(p.lon, p.lat);
            total += prev.map_or(0.0, |prev| Haversine.distance(prev, here));
            distances.push(total);
            prev = Some(here);
        }
        let elevations: Vec<f64> = points.iter().map(|p| p.elevation.unwrap_or(0.0)).collect();

        let mut multipliers = [1.0; COURSE_KM];
        for (km, m) in multipliers.iter_mut().enumerate() {
            let start = km as f64 * 1000.0;
            let end = start + 1000.0;
            let (gain, loss) = elevation_change(&distances, &elevations, start, end);
            *m = 1.0 + gain * GAIN_FACTOR - loss * LOSS_FACTOR;
        }

        Self::new(&multipliers)
    }

    pub fn multipliers(&self) -> &[f64; COURSE_KM] {
        &self.multipliers
    }

    pub fn at(&self, km: usize) -> f64 {
        self.multipliers[km]
    }
}

impl Default for CourseProfile {
    fn default() -> Self {
        Self::london()
    }
}

/// The course consumed by [`crate::simulation::simulate`].
pub fn course_profile() -> CourseProfile {
    CourseProfile::london()
}

/// A recorded trackpoint, independent of the file format it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoursePoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
}

/// Sums gain and loss between two distances along the track, including the
/// interpolated partial segments at either boundary.
fn elevation_change(distances: &[f64], elevations: &[f64], start: f64, end: f64) -> (f64, f64) {
    let mut samples = vec![interpolate_elevation(distances, elevations, start)];
    samples.extend(
        distances
            .iter()
            .zip(elevations)
            .filter(|(d, _)| **d > start && **d < end)
            .map(|(_, e)| *e),
    );
    samples.push(interpolate_elevation(distances, elevations, end));

    samples.windows(2).fold((0.0, 0.0), |(gain, loss), w| {
        let diff = w[1] - w[0];
        if diff > 0.0 {
            (gain + diff, loss)
        } else {
            (gain, loss - diff)
        }
    })
}

/// Linear elevation at a cumulative distance, clamped to the track ends.
fn interpolate_elevation(distances: &[f64], elevations: &[f64], at: f64) -> f64 {
    let upper = distances.partition_point(|d| *d < at);
    if upper == 0 {
        return elevations[0];
    }
    if upper >= distances.len() {
        return elevations[elevations.len() - 1];
    }

    let (d1, d2) = (distances[upper - 1], distances[upper]);
    let (e1, e2) = (elevations[upper - 1], elevations[upper]);
    if (d2 - d1).abs() < f64::EPSILON {
        return e2;
    }
    e1 + (e2 - e1) * (at - d1) / (d2 - d1)
}
