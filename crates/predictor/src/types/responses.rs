//! Response types for API endpoints.

use serde::Serialize;

use crate::{
    leaderboard::{LeaderboardEntry, RunnerStatus},
    runners::Runner,
    stats::AggregateResult,
    timefmt::format_hms,
};

/// Finish-time distribution for one runner.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predicted_mean: String,
    pub predicted_median: String,
    pub lower_5_percent: String,
    pub lower_25_percent: String,
    pub upper_75_percent: String,
    pub upper_95_percent: String,
    pub std_dev_seconds: f64,
    pub dnf_rate_percent: f64,
    pub dnf_count: usize,
    pub finishers: usize,
    pub simulations: usize,
    pub temp_celsius: f64,
    pub mean_splits_seconds: Vec<f64>,
}

impl From<&AggregateResult> for PredictionResponse {
    fn from(r: &AggregateResult) -> Self {
        Self {
            predicted_mean: format_hms(r.mean_time),
            predicted_median: format_hms(r.median),
            lower_5_percent: format_hms(r.p5),
            lower_25_percent: format_hms(r.p25),
            upper_75_percent: format_hms(r.p75),
            upper_95_percent: format_hms(r.p95),
            std_dev_seconds: r.std_dev,
            dnf_rate_percent: r.dnf_rate * 100.0,
            dnf_count: r.dnf_count,
            finishers: r.finishers,
            simulations: r.simulations,
            temp_celsius: r.temp_celsius,
            mean_splits_seconds: r.mean_splits.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunnerResponse {
    pub name: String,
    pub pb_time: String,
    pub pb_seconds: f64,
}

impl From<&Runner> for RunnerResponse {
    fn from(r: &Runner) -> Self {
        Self {
            name: r.name.clone(),
            pb_time: r.pb_time.clone(),
            pb_seconds: r.pb_seconds,
        }
    }
}

/// Leaderboard row. DNF rows carry no rank.
#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub rank: Option<usize>,
    pub name: String,
    pub pb_time: String,
    pub predicted_median: String,
    pub predicted_mean: String,
    pub p5: String,
    pub p95: String,
    pub dnf_rate_percent: f64,
    pub status: RunnerStatus,
}

impl LeaderboardRow {
    /// Numbers finishers 1.. in board order.
    pub fn from_ranked(entries: &[LeaderboardEntry]) -> Vec<Self> {
        let mut next_rank = 0;
        entries
            .iter()
            .map(|e| {
                let rank = match e.status {
                    RunnerStatus::Finisher => {
                        next_rank += 1;
                        Some(next_rank)
                    }
                    RunnerStatus::Dnf => None,
                };
                let time = |secs: f64| match e.status {
                    RunnerStatus::Finisher => format_hms(secs),
                    RunnerStatus::Dnf => "DNF".to_string(),
                };
                Self {
                    rank,
                    name: e.name.clone(),
                    pb_time: e.pb_time.clone(),
                    predicted_median: time(e.predicted_median),
                    predicted_mean: time(e.predicted_mean),
                    p5: time(e.p5),
                    p95: time(e.p95),
                    dnf_rate_percent: e.dnf_rate * 100.0,
                    status: e.status,
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub source: String,
    pub multipliers: Vec<f64>,
}
