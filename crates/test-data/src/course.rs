//! Procedural marathon course generation.

use geo::{Destination as _, Haversine, geometry::Point};
use predictor::course::CoursePoint;
use rand::Rng;

use crate::terrain::{ElevationGenerator, add_elevation_jitter};

/// Official marathon distance in meters.
pub const MARATHON_METERS: f64 = 42_195.0;

/// Configuration for course generation.
#[derive(Debug, Clone)]
pub struct CourseConfig {
    /// Course length in meters.
    pub distance_meters: f64,
    /// Start (lat, lon).
    pub start: (f64, f64),
    /// Distance between trackpoints in meters.
    pub point_spacing_m: f64,
    /// Maximum heading change per point, in degrees.
    pub max_turn_deg: f64,
    /// Altimeter noise standard deviation in meters.
    pub elevation_jitter_m: f64,
    /// Fraction of points recorded without elevation.
    pub missing_elevation_probability: f64,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            distance_meters: MARATHON_METERS,
            start: (51.4721, 0.0007), // Greenwich Park
            point_spacing_m: 25.0,
            max_turn_deg: 8.0,
            elevation_jitter_m: 0.0,
            missing_elevation_probability: 0.0,
        }
    }
}

/// Generates synthetic courses as ordered trackpoints.
pub struct CourseGenerator {
    config: CourseConfig,
    elevation: ElevationGenerator,
}

impl CourseGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: CourseConfig::default(),
            elevation: ElevationGenerator::london(seed),
        }
    }

    pub fn with_config(mut self, config: CourseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_elevation(mut self, elevation: ElevationGenerator) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    /// Walks a wandering route of the configured length.
    ///
    /// Steps are laid out on the haversine sphere, so the distance a loader
    /// measures between points matches the step length.
    pub fn generate(&self, rng: &mut impl Rng) -> Vec<CoursePoint> {
        let spacing = self.config.point_spacing_m.max(1.0);
        let steps = (self.config.distance_meters / spacing).ceil() as usize;
        let (lat, lon) = self.config.start;

        let mut current = Point::new(lon, lat);
        let mut bearing: f64 = rng.gen_range(0.0..360.0);
        let mut points = Vec::with_capacity(steps + 1);

        for i in 0..=steps {
            let distance = (i as f64 * spacing).min(self.config.distance_meters);
            if i > 0 {
                let step = distance - (i - 1) as f64 * spacing;
                current = Haversine.destination(current, bearing, step);
                let turn = self.config.max_turn_deg;
                if turn > 0.0 {
                    bearing = (bearing + rng.gen_range(-turn..turn)).rem_euclid(360.0);
                }
            }

            let missing = self.config.missing_elevation_probability.clamp(0.0, 1.0);
            let elevation = if rng.gen_bool(missing) {
                None
            } else {
                let e = self.elevation.elevation_at(distance);
                Some(add_elevation_jitter(e, rng, self.config.elevation_jitter_m))
            };

            points.push(CoursePoint {
                lat: current.y(),
                lon: current.x(),
                elevation,
            });
        }

        points
    }
}
