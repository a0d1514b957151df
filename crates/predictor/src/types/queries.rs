//! Query string parameters for API endpoints.

use serde::Deserialize;

/// Single-runner prediction query.
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    /// Personal best as `H:MM:SS`.
    pub pb_time: String,
    /// Fixed fatigue coefficient; sampled by calibre when absent.
    pub fatigue_coeff: Option<f64>,
    pub temp_celsius: Option<f64>,
    pub simulations: Option<usize>,
    pub seed: Option<u64>,
}

/// Whole-field leaderboard query.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub temp_celsius: Option<f64>,
    pub simulations: Option<usize>,
    pub seed: Option<u64>,
}
