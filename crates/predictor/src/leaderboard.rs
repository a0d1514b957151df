//! Field predictions ranked into a leaderboard.

use serde::Serialize;
use tracing::debug;

use crate::{
    config::SimulationConfig,
    errors::AppError,
    runners::Runner,
    simulation::{CancelToken, RaceSimulator},
    stats::AggregateResult,
};

/// A runner is listed as DNF when more than half their simulated races end early.
pub const DNF_STATUS_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerStatus {
    Finisher,
    Dnf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub pb_time: String,
    pub pb_seconds: f64,
    pub predicted_median: f64,
    pub predicted_mean: f64,
    pub p5: f64,
    pub p95: f64,
    pub dnf_rate: f64,
    pub status: RunnerStatus,
}

impl LeaderboardEntry {
    pub fn from_result(runner: &Runner, result: &AggregateResult) -> Self {
        let status = if result.dnf_rate > DNF_STATUS_THRESHOLD {
            RunnerStatus::Dnf
        } else {
            RunnerStatus::Finisher
        };
        Self {
            name: runner.name.clone(),
            pb_time: runner.pb_time.clone(),
            pb_seconds: runner.pb_seconds,
            predicted_median: result.median,
            predicted_mean: result.mean_time,
            p5: result.p5,
            p95: result.p95,
            dnf_rate: result.dnf_rate,
            status,
        }
    }
}

/// Sorts finishers by predicted median, fastest first, with DNFs last in
/// their input order.
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| match (a.status, b.status) {
        (RunnerStatus::Finisher, RunnerStatus::Finisher) => {
            a.predicted_median.total_cmp(&b.predicted_median)
        }
        (sa, sb) => sa.cmp(&sb),
    });
    entries
}

/// Simulates every runner and returns the ranked field.
///
/// With a fixed seed each runner gets its own derived seed, so the board is
/// reproducible.
pub fn predict_field(
    simulator: &RaceSimulator,
    runners: &[Runner],
    config: &SimulationConfig,
    cancel: &CancelToken,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let entries = runners
        .iter()
        .enumerate()
        .map(|(i, runner)| {
            let runner_config = SimulationConfig {
                seed: config.seed.map(|s| s.wrapping_add(i as u64)),
                ..config.clone()
            };
            let result =
                simulator.simulate_cancellable(runner.pb_seconds, &runner_config, cancel)?;
            debug!(
                runner = %runner.name,
                median = result.median,
                dnf_rate = result.dnf_rate,
                "Predicted runner"
            );
            Ok(LeaderboardEntry::from_result(runner, &result))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(rank(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnf::{DnfTier, dnf_table};
    use crate::tiers::{Tier, hms};

    fn entry(name: &str, median: f64, dnf_rate: f64) -> LeaderboardEntry {
        let runner = Runner::new(name, "2:05:00").unwrap();
        let result = AggregateResult {
            mean_time: median,
            std_dev: 0.0,
            median,
            p5: median,
            p25: median,
            p75: median,
            p95: median,
            mean_splits: vec![median / 42.0; 42],
            temp_celsius: 15.0,
            dnf_count: 0,
            dnf_rate,
            finishers: 1,
            simulations: 1,
        };
        LeaderboardEntry::from_result(&runner, &result)
    }

    #[test]
    fn test_dnf_threshold() {
        assert_eq!(entry("a", 7400.0, 0.5).status, RunnerStatus::Finisher);
        assert_eq!(entry("b", 7400.0, 0.51).status, RunnerStatus::Dnf);
    }

    #[test]
    fn test_ranking_puts_dnf_last() {
        let ranked = rank(vec![
            entry("Slow", 7600.0, 0.05),
            // Fastest nominal time, but mostly abandons
            entry("Fragile", 7200.0, 0.8),
            entry("Fast", 7350.0, 0.03),
        ]);

        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Fast", "Slow", "Fragile"]);
        assert_eq!(ranked[2].status, RunnerStatus::Dnf);
    }

    #[test]
    fn test_predict_field() {
        // Runners slower than 2:10 always abandon
        let dnf = dnf_table(vec![
            Tier::bounded(hms(2, 10, 0), DnfTier {
                race_dnf_probability: 0.0,
            }),
            Tier::catch_all(DnfTier {
                race_dnf_probability: 1.0,
            }),
        ])
        .unwrap();
        let sim = RaceSimulator::default().with_dnf_tiers(dnf);
        let runners = vec![
            Runner::new("Club Runner", "2:20:00").unwrap(),
            Runner::new("Sub Elite", "2:08:00").unwrap(),
            Runner::new("Elite", "2:03:00").unwrap(),
        ];
        let config = SimulationConfig::default()
            .with_seed(5)
            .with_fatigue_coeff(0.0008)
            .with_simulations(400);

        let board = predict_field(&sim, &runners, &config, &CancelToken::new()).unwrap();
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Elite", "Sub Elite", "Club Runner"]);
        assert_eq!(board[2].status, RunnerStatus::Dnf);
        assert_eq!(board[2].dnf_rate, 1.0);
        assert!(board[0].predicted_median < board[1].predicted_median);

        let again = predict_field(&sim, &runners, &config, &CancelToken::new()).unwrap();
        assert_eq!(board, again);
    }
}
