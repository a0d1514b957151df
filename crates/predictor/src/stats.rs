//! Aggregate statistics over finishers.

use serde::Serialize;

use crate::course::COURSE_KM;

/// Read-only summary of one simulation run.
///
/// Time fields cover finishers only. With zero finishers `mean_time` is
/// `f64::INFINITY`, the other time fields are 0 and `mean_splits` is all 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub mean_time: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p5: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub mean_splits: Vec<f64>,
    pub temp_celsius: f64,
    pub dnf_count: usize,
    pub dnf_rate: f64,
    pub finishers: usize,
    pub simulations: usize,
}

impl AggregateResult {
    /// Summarises finish times and per-km split sums.
    ///
    /// `finish_times` is sorted in place.
    pub(crate) fn from_finishers(
        finish_times: &mut [f64],
        split_sums: &[f64; COURSE_KM],
        dnf_count: usize,
        simulations: usize,
        temp_celsius: f64,
    ) -> Self {
        let finishers = finish_times.len();
        let dnf_rate = if simulations == 0 {
            0.0
        } else {
            dnf_count as f64 / simulations as f64
        };

        if finishers == 0 {
            return Self {
                mean_time: f64::INFINITY,
                std_dev: 0.0,
                median: 0.0,
                p5: 0.0,
                p25: 0.0,
                p75: 0.0,
                p95: 0.0,
                mean_splits: vec![0.0; COURSE_KM],
                temp_celsius,
                dnf_count,
                dnf_rate,
                finishers,
                simulations,
            };
        }

        finish_times.sort_by(f64::total_cmp);
        let mean_time = mean(finish_times);
        let n = finishers as f64;

        Self {
            mean_time,
            std_dev: std_dev(finish_times, mean_time),
            median: percentile(finish_times, 50.0),
            p5: percentile(finish_times, 5.0),
            p25: percentile(finish_times, 25.0),
            p75: percentile(finish_times, 75.0),
            p95: percentile(finish_times, 95.0),
            mean_splits: split_sums.iter().map(|s| s / n).collect(),
            temp_celsius,
            dnf_count,
            dnf_rate,
            finishers,
            simulations,
        }
    }

    pub fn has_finishers(&self) -> bool {
        self.finishers > 0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a known mean.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Linearly interpolated percentile of an ascending slice, `p` in 0..=100.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let w = rank - lower as f64;
    sorted[lower] * (1.0 - w) + sorted[upper] * w
}
