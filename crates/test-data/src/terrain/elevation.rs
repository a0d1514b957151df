//! Perlin noise-based elevation along a course.

use noise::{NoiseFn, Perlin};
use rand::Rng;

/// Generates elevation as a function of distance along a course.
///
/// Several octaves of Perlin noise give long rolling climbs with small
/// bumps on top. Sampling by distance rather than position keeps the
/// profile independent of the route's shape.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    /// Base elevation in meters.
    base_elevation: f64,
    /// Peak deviation from the base in meters.
    height_scale: f64,
    /// Noise cycles per meter of course.
    frequency: f64,
    octaves: u32,
}

impl ElevationGenerator {
    /// Gently rolling city course.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 20.0,
            height_scale: 15.0,
            frequency: 0.0002, // one swell every ~5 km
            octaves: 3,
        }
    }

    /// Thames-side profile: low base, little relief.
    pub fn london(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 10.0,
            height_scale: 8.0,
            frequency: 0.00015,
            octaves: 3,
        }
    }

    /// Hilly course with climbs of several tens of meters.
    pub fn hilly(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 250.0,
            height_scale: 120.0,
            frequency: 0.0003,
            octaves: 4,
        }
    }

    /// Perfectly flat course.
    pub fn flat(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 5.0,
            height_scale: 0.0,
            frequency: 0.0002,
            octaves: 1,
        }
    }

    /// Elevation at `distance_m` along the course.
    pub fn elevation_at(&self, distance_m: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            // Offset y so each octave samples a different slice
            total += self.perlin.get([distance_m * frequency, max_amplitude]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        let normalized = total / max_amplitude; // -1..1
        self.base_elevation + normalized * self.height_scale
    }

    /// Elevations at each of the given cumulative distances.
    pub fn elevation_profile(&self, distances_m: &[f64]) -> Vec<f64> {
        distances_m.iter().map(|d| self.elevation_at(*d)).collect()
    }
}

/// Adds GPS-style elevation error (barometric/GPS altimeters are ±3-20 m).
pub fn add_elevation_jitter(elevation: f64, rng: &mut impl Rng, std_dev: f64) -> f64 {
    use rand_distr::{Distribution, Normal};
    match Normal::new(0.0, std_dev) {
        Ok(normal) => elevation + normal.sample(rng),
        Err(_) => elevation,
    }
}
