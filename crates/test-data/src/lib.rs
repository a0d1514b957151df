//! Test data generation for the marathon predictor.
//!
//! Builds synthetic courses (a wandering route with Perlin-noise terrain)
//! and writes them as GPX so the predictor's course loader can be exercised
//! end to end.
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let points = CourseGenerator::new(7)
//!     .with_elevation(ElevationGenerator::hilly(7))
//!     .generate(&mut rng);
//! std::fs::write("hilly.gpx", generate_gpx(&points, "Hilly"))?;
//! ```

pub mod course;
pub mod gpx;
pub mod terrain;

pub use predictor::course::CoursePoint;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::CoursePoint;
    pub use crate::course::{CourseConfig, CourseGenerator, MARATHON_METERS};
    pub use crate::gpx::generate_gpx;
    pub use crate::terrain::ElevationGenerator;
}
