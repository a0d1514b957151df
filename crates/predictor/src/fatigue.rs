//! Late-race fatigue.
//!
//! Pace is unaffected up to 30 km and then degrades convexly. The severity
//! coefficient is either fixed by the caller or drawn once per simulated race
//! from a calibre-dependent log-normal, which models day-to-day durability.

use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    tiers::{Tier, TierTable, TierValue, hms},
};

/// Distance after which fatigue sets in.
pub const FATIGUE_ONSET_KM: f64 = 30.0;
/// Exponent of the post-onset blow-up.
pub const FATIGUE_EXPONENT: f64 = 1.8;

/// Pace multiplier for a given distance and fatigue coefficient.
pub fn fatigue_multiplier(distance_km: f64, coeff: f64) -> f64 {
    if distance_km <= FATIGUE_ONSET_KM {
        1.0
    } else {
        1.0 + coeff * (distance_km - FATIGUE_ONSET_KM).powf(FATIGUE_EXPONENT)
    }
}

/// Log-normal parameters for a calibre tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueTier {
    /// Median coefficient; the underlying normal has mean `ln(median)`.
    pub median_coefficient: f64,
    /// Standard deviation of the underlying normal.
    pub sigma: f64,
}

impl TierValue for FatigueTier {
    fn validate(&self) -> Result<(), AppError> {
        if !(self.median_coefficient.is_finite() && self.median_coefficient > 0.0) {
            return Err(AppError::invalid(format!(
                "fatigue median must be positive, got {}",
                self.median_coefficient
            )));
        }
        if !(self.sigma.is_finite() && self.sigma >= 0.0) {
            return Err(AppError::invalid(format!(
                "fatigue sigma must be non-negative, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

pub type FatigueTable = TierTable<FatigueTier>;

/// Builds a fatigue table, validating the log-normal parameters.
pub fn fatigue_table(tiers: Vec<Tier<FatigueTier>>) -> Result<FatigueTable, AppError> {
    TierTable::new(tiers)
}

pub fn default_fatigue_table() -> FatigueTable {
    let tier = |median_coefficient, sigma| FatigueTier {
        median_coefficient,
        sigma,
    };
    TierTable::new(vec![
        Tier::bounded(hms(2, 5, 0), tier(0.0008, 1.0)),
        Tier::bounded(hms(2, 10, 0), tier(0.0014, 1.1)),
        Tier::bounded(hms(2, 15, 0), tier(0.0022, 1.2)),
        Tier::catch_all(tier(0.0035, 1.3)),
    ])
    .expect("default fatigue tiers are valid")
}

/// Source of the per-race fatigue coefficient.
#[derive(Debug, Clone, Copy)]
pub enum FatigueModel {
    /// Same coefficient for every race.
    Fixed(f64),
    /// One log-normal draw per race.
    Sampled(LogNormal<f64>),
}

impl FatigueModel {
    pub fn fixed(coeff: f64) -> Result<Self, AppError> {
        if !(coeff.is_finite() && coeff >= 0.0) {
            return Err(AppError::invalid(format!(
                "fatigue coefficient must be non-negative, got {coeff}"
            )));
        }
        Ok(Self::Fixed(coeff))
    }

    /// Sampled model for the tier matching `pb_seconds`.
    pub fn for_calibre(table: &FatigueTable, pb_seconds: f64) -> Result<Self, AppError> {
        let tier = table.value_for(pb_seconds);
        let dist = LogNormal::new(tier.median_coefficient.ln(), tier.sigma)
            .map_err(|e| AppError::invalid(format!("bad fatigue tier {tier:?}: {e}")))?;
        Ok(Self::Sampled(dist))
    }

    /// Resolves the override if present, otherwise samples by calibre.
    pub fn resolve(
        table: &FatigueTable,
        pb_seconds: f64,
        override_coeff: Option<f64>,
    ) -> Result<Self, AppError> {
        match override_coeff {
            Some(coeff) => Self::fixed(coeff),
            None => Self::for_calibre(table, pb_seconds),
        }
    }

    /// Coefficient for one simulated race.
    pub fn draw(&self, rng: &mut impl Rng) -> f64 {
        match self {
            FatigueModel::Fixed(coeff) => *coeff,
            FatigueModel::Sampled(dist) => dist.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_no_fatigue_before_onset() {
        for km in 0..=30 {
            for coeff in [0.0, 0.0008, 0.5, 10.0] {
                assert_eq!(fatigue_multiplier(km as f64, coeff), 1.0);
            }
        }
    }

    #[test]
    fn test_strictly_increasing_after_onset() {
        for coeff in [0.0001, 0.0008, 0.0035] {
            let mut prev = fatigue_multiplier(30.0, coeff);
            for km in 31..=42 {
                let m = fatigue_multiplier(km as f64, coeff);
                assert!(m > prev, "km {km}: {m} <= {prev}");
                prev = m;
            }
        }
    }

    #[test]
    fn test_known_value() {
        // 12^1.8 ~= 87.84
        let m = fatigue_multiplier(42.0, 0.001);
        assert!((m - (1.0 + 0.001 * 12f64.powf(1.8))).abs() < 1e-12);
        assert!(m > 1.087 && m < 1.089);
    }

    #[test]
    fn test_default_tiers() {
        let table = default_fatigue_table();
        assert_eq!(table.value_for(hms(2, 2, 5)).median_coefficient, 0.0008);
        assert_eq!(table.value_for(hms(2, 7, 30)).median_coefficient, 0.0014);
        assert_eq!(table.value_for(hms(2, 15, 0)).median_coefficient, 0.0022);
        assert_eq!(table.value_for(hms(2, 15, 1)).sigma, 1.3);
    }

    #[test]
    fn test_fixed_draw() {
        let model = FatigueModel::resolve(&default_fatigue_table(), 7325.0, Some(0.002)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(model.draw(&mut rng), 0.002);
        assert!(FatigueModel::fixed(-1.0).is_err());
        assert!(FatigueModel::fixed(f64::NAN).is_err());
    }

    #[test]
    fn test_sampled_median_matches_tier() {
        let model = FatigueModel::resolve(&default_fatigue_table(), 7325.0, None).unwrap();
        let mut rng = StdRng::seed_from_u64(12345);

        let mut draws: Vec<f64> = (0..5001).map(|_| model.draw(&mut rng)).collect();
        assert!(draws.iter().all(|d| *d > 0.0));
        draws.sort_by(f64::total_cmp);
        let median = draws[draws.len() / 2];

        // sigma = 1.0, so the sample median should land close to 0.0008
        assert!(median > 0.0006 && median < 0.0011, "median {median}");
    }

    #[test]
    fn test_table_validation() {
        let bad = vec![Tier::catch_all(FatigueTier {
            median_coefficient: 0.0,
            sigma: 1.0,
        })];
        assert!(fatigue_table(bad).is_err());

        let good = vec![Tier::catch_all(FatigueTier {
            median_coefficient: 0.001,
            sigma: 0.0,
        })];
        assert!(fatigue_table(good).is_ok());
    }

    #[test]
    fn test_deserialized_table_is_validated() {
        let parse = |median: f64, sigma: f64| {
            serde_json::from_value::<FatigueTable>(serde_json::json!([{
                "upper_bound_seconds": null,
                "value": { "median_coefficient": median, "sigma": sigma }
            }]))
        };
        assert!(parse(-0.001, 1.0).is_err());
        assert!(parse(0.001, -0.5).is_err());
        assert!(parse(0.001, 0.5).is_ok());
    }
}
