//! Thermoregulatory slowdown.

/// Temperature at or below which heat has no effect.
pub const HEAT_THRESHOLD_C: f64 = 8.0;
/// Fractional slowdown per degree above the threshold, at km 1.
pub const HEAT_PENALTY_PER_C: f64 = 0.0003;
/// Extra drift reached at km 42 (penalty is 1.8x the km 1 value).
const HEAT_DRIFT: f64 = 0.8;

/// Pace multiplier for heat at a given distance.
///
/// The penalty grows linearly with distance since a runner's core
/// temperature keeps climbing through the race. No bonus below 8 °C.
pub fn heat_multiplier(distance_km: f64, temp_celsius: f64) -> f64 {
    if temp_celsius <= HEAT_THRESHOLD_C {
        return 1.0;
    }

    let excess = temp_celsius - HEAT_THRESHOLD_C;
    let base_penalty = excess * HEAT_PENALTY_PER_C;
    let drift = 1.0 + HEAT_DRIFT * ((distance_km - 1.0) / 41.0);
    1.0 + base_penalty * drift
}
