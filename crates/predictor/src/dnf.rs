//! Did-not-finish hazard.
//!
//! Each calibre tier has a whole-race DNF probability. It is spread as a
//! constant per-kilometre hazard over kilometres 31 to 42, so surviving all
//! twelve at-risk kilometres has probability `1 - dnf_rate`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    tiers::{Tier, TierTable, TierValue, hms},
};

/// Last kilometre without abandonment risk.
pub const DNF_ONSET_KM: usize = 30;
/// Number of kilometres carrying the hazard.
pub const AT_RISK_KM: usize = 12;

/// Whole-race DNF probability for a calibre tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DnfTier {
    pub race_dnf_probability: f64,
}

impl TierValue for DnfTier {
    fn validate(&self) -> Result<(), AppError> {
        if (0.0..=1.0).contains(&self.race_dnf_probability) {
            Ok(())
        } else {
            Err(AppError::invalid(format!(
                "DNF probability must be within [0, 1], got {}",
                self.race_dnf_probability
            )))
        }
    }
}

pub type DnfTable = TierTable<DnfTier>;

/// Validates that every tier probability lies in `[0, 1]`.
pub fn dnf_table(tiers: Vec<Tier<DnfTier>>) -> Result<DnfTable, AppError> {
    TierTable::new(tiers)
}

pub fn default_dnf_table() -> DnfTable {
    let tier = |race_dnf_probability| DnfTier {
        race_dnf_probability,
    };
    TierTable::new(vec![
        Tier::bounded(hms(2, 5, 0), tier(0.03)),
        Tier::bounded(hms(2, 10, 0), tier(0.05)),
        Tier::bounded(hms(2, 15, 0), tier(0.07)),
        Tier::catch_all(tier(0.10)),
    ])
    .expect("default DNF tiers are valid")
}

/// Whole-race DNF probability for a runner.
pub fn dnf_rate(table: &DnfTable, pb_seconds: f64) -> f64 {
    table.value_for(pb_seconds).race_dnf_probability
}

/// Converts a whole-race probability into the per-km hazard.
pub fn per_km_hazard(dnf_rate: f64) -> f64 {
    if dnf_rate <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - dnf_rate).powf(1.0 / AT_RISK_KM as f64)
}

/// Per-km abandonment check for one runner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DnfHazard {
    dnf_rate: f64,
    per_km: f64,
}

impl DnfHazard {
    pub fn new(dnf_rate: f64) -> Self {
        Self {
            dnf_rate,
            per_km: per_km_hazard(dnf_rate),
        }
    }

    pub fn for_calibre(table: &DnfTable, pb_seconds: f64) -> Self {
        Self::new(dnf_rate(table, pb_seconds))
    }

    pub fn dnf_rate(&self) -> f64 {
        self.dnf_rate
    }

    pub fn per_km(&self) -> f64 {
        self.per_km
    }

    /// Whether `distance_km` (1-based) carries any risk.
    pub fn applies_at(&self, distance_km: usize) -> bool {
        distance_km > DNF_ONSET_KM && self.per_km > 0.0
    }

    /// Rolls for abandonment in the kilometre ending at `distance_km`.
    ///
    /// Consumes a random draw only when the kilometre is at risk.
    pub fn abandons(&self, distance_km: usize, rng: &mut impl Rng) -> bool {
        self.applies_at(distance_km) && rng.r#gen::<f64>() < self.per_km
    }
}
