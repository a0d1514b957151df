//! Calibre-tiered lookup tables.
//!
//! Both the fatigue model and the DNF hazard are keyed on a runner's personal
//! best. A table is an ascending list of upper bounds; the first tier whose
//! bound is at least the calibre wins, and the last tier is an unbounded
//! catch-all. Tier values check themselves through [`TierValue`], so a table
//! built directly or deserialized never carries out-of-range parameters.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Converts `H:MM:SS` components to seconds for tier bounds.
pub const fn hms(hours: u32, minutes: u32, seconds: u32) -> f64 {
    (hours * 3600 + minutes * 60 + seconds) as f64
}

/// Range check applied to every value when a table is built.
pub trait TierValue {
    fn validate(&self) -> Result<(), AppError>;
}

/// A single tier: values apply to runners with `pb <= upper_bound_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier<T> {
    /// Inclusive upper bound in seconds. `None` marks the catch-all tier.
    pub upper_bound_seconds: Option<f64>,
    pub value: T,
}

impl<T> Tier<T> {
    pub fn bounded(upper_bound_seconds: f64, value: T) -> Self {
        Self {
            upper_bound_seconds: Some(upper_bound_seconds),
            value,
        }
    }

    pub fn catch_all(value: T) -> Self {
        Self {
            upper_bound_seconds: None,
            value,
        }
    }
}

/// Immutable, validated table of tiers ordered by ascending bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<Tier<T>>",
    into = "Vec<Tier<T>>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: Deserialize<'de> + TierValue"
    )
)]
pub struct TierTable<T: Clone + TierValue> {
    tiers: Vec<Tier<T>>,
}

impl<T: Clone + TierValue> TierTable<T> {
    /// Builds a table, checking that bounds are finite and strictly
    /// ascending, that exactly the last tier is unbounded, and that every
    /// value passes [`TierValue::validate`].
    pub fn new(tiers: Vec<Tier<T>>) -> Result<Self, AppError> {
        let Some((last, bounded)) = tiers.split_last() else {
            return Err(AppError::invalid("tier table must not be empty"));
        };
        if last.upper_bound_seconds.is_some() {
            return Err(AppError::invalid("last tier must be an unbounded catch-all"));
        }

        let mut previous = f64::NEG_INFINITY;
        for tier in bounded {
            let bound = tier.upper_bound_seconds.ok_or_else(|| {
                AppError::invalid("only the last tier may be unbounded")
            })?;
            if !bound.is_finite() || bound <= previous {
                return Err(AppError::invalid(format!(
                    "tier bounds must be finite and strictly ascending (got {bound} after {previous})"
                )));
            }
            previous = bound;
        }
        tiers.iter().try_for_each(|t| t.value.validate())?;

        Ok(Self { tiers })
    }

    /// Returns the first tier whose upper bound is `>= pb_seconds`.
    pub fn lookup(&self, pb_seconds: f64) -> &Tier<T> {
        let idx = self
            .tiers
            .partition_point(|t| t.upper_bound_seconds.is_some_and(|b| b < pb_seconds));
        // The catch-all tier guarantees idx is in range.
        &self.tiers[idx.min(self.tiers.len() - 1)]
    }

    pub fn value_for(&self, pb_seconds: f64) -> &T {
        &self.lookup(pb_seconds).value
    }

}

impl<T: Clone + TierValue> TryFrom<Vec<Tier<T>>> for TierTable<T> {
    type Error = AppError;

    fn try_from(tiers: Vec<Tier<T>>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl<T: Clone + TierValue> From<TierTable<T>> for Vec<Tier<T>> {
    fn from(table: TierTable<T>) -> Self {
        table.tiers
    }
}
