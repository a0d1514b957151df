//! Monte Carlo race simulation.
//!
//! Every simulated race walks the 42 km of the course, rolling for
//! abandonment past 30 km and timing each kilometre as
//! `base_pace × fatigue × heat × course × (1 + noise)`. Races are grouped into
//! fixed-size chunks with their own seeded generator and run on a rayon pool;
//! chunk tallies are merged in chunk order after every race is accounted for,
//! so a fixed seed gives bit-identical results on any number of threads.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Exp1, StandardNormal};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    config::SimulationConfig,
    course::{COURSE_KM, CourseProfile, course_profile},
    dnf::{DnfHazard, DnfTable, default_dnf_table},
    errors::AppError,
    fatigue::{FatigueModel, FatigueTable, default_fatigue_table, fatigue_multiplier},
    heat::heat_multiplier,
    stats::AggregateResult,
};

/// Official marathon distance used to turn a PB into a flat pace.
pub const MARATHON_KM: f64 = 42.195;
/// Chance per kilometre of a bad patch (cramp, GI trouble, wind).
pub const BAD_PATCH_PROBABILITY: f64 = 0.20;
/// Mean bad-patch size as a multiple of that kilometre's noise sigma.
const BAD_PATCH_SCALE: f64 = 2.5;
const RACES_PER_CHUNK: usize = 512;

/// Cooperative stop flag, checked between races.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Terminal state of one simulated race.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceOutcome {
    Finished {
        fatigue_coefficient: f64,
        splits: [f64; COURSE_KM],
    },
    Abandoned {
        fatigue_coefficient: f64,
        /// Kilometre (1-based) in which the runner stopped.
        at_km: usize,
    },
}

impl RaceOutcome {
    pub fn finish_time(&self) -> Option<f64> {
        match self {
            RaceOutcome::Finished { splits, .. } => Some(splits.iter().sum()),
            RaceOutcome::Abandoned { .. } => None,
        }
    }
}

/// Noise sigma for a 0-based kilometre: 0.5% at km 1 up to 2.5% at km 42.
pub fn noise_sigma(km: usize) -> f64 {
    0.005 + 0.020 * (km as f64 / (COURSE_KM - 1) as f64)
}

/// Right-skewed pace noise: Gaussian plus an occasional exponential spike.
pub fn sample_noise(km: usize, rng: &mut impl Rng) -> f64 {
    let sigma = noise_sigma(km);
    let mut noise = sigma * rng.sample::<f64, _>(StandardNormal);
    if rng.r#gen::<f64>() < BAD_PATCH_PROBABILITY {
        noise += sigma * BAD_PATCH_SCALE * rng.sample::<f64, _>(Exp1);
    }
    noise
}

/// Per-runner constants shared read-only by every race of a run.
#[derive(Debug, Clone)]
struct RaceContext {
    base_pace: f64,
    fatigue: FatigueModel,
    hazard: DnfHazard,
    heat: [f64; COURSE_KM],
    course: [f64; COURSE_KM],
}

impl RaceContext {
    fn run_race(&self, rng: &mut impl Rng) -> RaceOutcome {
        let fatigue_coefficient = self.fatigue.draw(rng);
        let mut splits = [0.0; COURSE_KM];

        for (km, split) in splits.iter_mut().enumerate() {
            let distance = km + 1;
            if self.hazard.abandons(distance, rng) {
                return RaceOutcome::Abandoned {
                    fatigue_coefficient,
                    at_km: distance,
                };
            }

            let fatigue = fatigue_multiplier(distance as f64, fatigue_coefficient);
            let noise = sample_noise(km, rng);
            *split = self.base_pace * fatigue * self.heat[km] * self.course[km] * (1.0 + noise);
        }

        RaceOutcome::Finished {
            fatigue_coefficient,
            splits,
        }
    }
}

/// Partial result of one chunk of races.
struct ChunkTally {
    finish_times: Vec<f64>,
    split_sums: [f64; COURSE_KM],
    dnf_count: usize,
    completed: usize,
}

impl ChunkTally {
    fn with_capacity(races: usize) -> Self {
        Self {
            finish_times: Vec::with_capacity(races),
            split_sums: [0.0; COURSE_KM],
            dnf_count: 0,
            completed: 0,
        }
    }

    fn record(&mut self, outcome: RaceOutcome) {
        self.completed += 1;
        match outcome {
            RaceOutcome::Finished { splits, .. } => {
                for (sum, split) in self.split_sums.iter_mut().zip(splits) {
                    *sum += split;
                }
                self.finish_times.push(splits.iter().sum());
            }
            RaceOutcome::Abandoned { .. } => self.dnf_count += 1,
        }
    }

    fn merge(mut self, other: ChunkTally) -> Self {
        self.finish_times.extend(other.finish_times);
        for (sum, other) in self.split_sums.iter_mut().zip(other.split_sums) {
            *sum += other;
        }
        self.dnf_count += other.dnf_count;
        self.completed += other.completed;
        self
    }
}

/// Derives an independent sub-seed for chunk `index`.
fn chunk_seed(seed: u64, index: u64) -> u64 {
    splitmix64(seed ^ index.wrapping_mul(0xD1B5_4A32_D192_ED03))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Runs simulated races for a runner over one course.
#[derive(Debug, Clone)]
pub struct RaceSimulator {
    course: CourseProfile,
    fatigue_tiers: FatigueTable,
    dnf_tiers: DnfTable,
}

impl RaceSimulator {
    pub fn new(course: CourseProfile) -> Self {
        Self {
            course,
            fatigue_tiers: default_fatigue_table(),
            dnf_tiers: default_dnf_table(),
        }
    }

    pub fn with_fatigue_tiers(mut self, tiers: FatigueTable) -> Self {
        self.fatigue_tiers = tiers;
        self
    }

    pub fn with_dnf_tiers(mut self, tiers: DnfTable) -> Self {
        self.dnf_tiers = tiers;
        self
    }

    pub fn course(&self) -> &CourseProfile {
        &self.course
    }

    pub fn simulate(
        &self,
        pb_seconds: f64,
        config: &SimulationConfig,
    ) -> Result<AggregateResult, AppError> {
        self.simulate_cancellable(pb_seconds, config, &CancelToken::new())
    }

    /// Like [`simulate`](Self::simulate), stopping at the next race boundary
    /// once `cancel` fires. A cancelled run yields `AppError::Cancelled`.
    pub fn simulate_cancellable(
        &self,
        pb_seconds: f64,
        config: &SimulationConfig,
        cancel: &CancelToken,
    ) -> Result<AggregateResult, AppError> {
        if !(pb_seconds.is_finite() && pb_seconds > 0.0) {
            return Err(AppError::invalid(format!(
                "personal best must be a positive number of seconds, got {pb_seconds}"
            )));
        }
        config.validate()?;

        let ctx = self.context(pb_seconds, config)?;
        let seed = config
            .seed
            .unwrap_or_else(|| rand::thread_rng().r#gen::<u64>());
        let simulations = config.simulations;
        let chunks = simulations.div_ceil(RACES_PER_CHUNK);

        debug!(
            pb_seconds,
            temp_celsius = config.temp_celsius,
            simulations,
            chunks,
            seed,
            dnf_rate = ctx.hazard.dnf_rate(),
            per_km_hazard = ctx.hazard.per_km(),
            fatigue = ?ctx.fatigue,
            "Starting race simulation"
        );
        let started = Instant::now();

        let run_chunks = || -> Vec<ChunkTally> {
            (0..chunks)
                .into_par_iter()
                .map(|chunk| {
                    let races = RACES_PER_CHUNK.min(simulations - chunk * RACES_PER_CHUNK);
                    let mut rng = StdRng::seed_from_u64(chunk_seed(seed, chunk as u64));
                    let mut tally = ChunkTally::with_capacity(races);
                    for _ in 0..races {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tally.record(ctx.run_race(&mut rng));
                    }
                    tally
                })
                .collect()
        };

        let tallies = match config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(run_chunks),
            None => run_chunks(),
        };

        let total = tallies
            .into_iter()
            .fold(ChunkTally::with_capacity(simulations), ChunkTally::merge);
        if total.completed != simulations {
            debug!(
                completed = total.completed,
                simulations, "Simulation cancelled"
            );
            return Err(AppError::Cancelled);
        }

        let mut finish_times = total.finish_times;
        let result = AggregateResult::from_finishers(
            &mut finish_times,
            &total.split_sums,
            total.dnf_count,
            simulations,
            config.temp_celsius,
        );

        info!(
            pb_seconds,
            simulations,
            finishers = result.finishers,
            dnf_count = result.dnf_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Race simulation complete"
        );

        Ok(result)
    }

    fn context(&self, pb_seconds: f64, config: &SimulationConfig) -> Result<RaceContext, AppError> {
        let fatigue = FatigueModel::resolve(
            &self.fatigue_tiers,
            pb_seconds,
            config.fatigue_coeff_override,
        )?;

        let mut heat = [1.0; COURSE_KM];
        for (km, h) in heat.iter_mut().enumerate() {
            *h = heat_multiplier((km + 1) as f64, config.temp_celsius);
        }

        Ok(RaceContext {
            base_pace: pb_seconds / MARATHON_KM,
            fatigue,
            hazard: DnfHazard::for_calibre(&self.dnf_tiers, pb_seconds),
            heat,
            course: *self.course.multipliers(),
        })
    }
}

impl Default for RaceSimulator {
    fn default() -> Self {
        Self::new(course_profile())
    }
}

/// Simulates `simulations` races on the London course with default tiers.
pub fn simulate(
    pb_seconds: f64,
    temp_celsius: f64,
    fatigue_coeff_override: Option<f64>,
    simulations: usize,
) -> Result<AggregateResult, AppError> {
    let config = SimulationConfig {
        temp_celsius,
        simulations,
        fatigue_coeff_override,
        ..Default::default()
    };
    RaceSimulator::default().simulate(pb_seconds, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnf::{DnfTier, dnf_table};
    use crate::fatigue::{FatigueTier, fatigue_table};
    use crate::tiers::Tier;

    const SAWE_PB: f64 = 7325.0;

    fn seeded(seed: u64) -> SimulationConfig {
        SimulationConfig::default()
            .with_seed(seed)
            .with_fatigue_coeff(0.0008)
            .with_simulations(2_000)
    }

    fn certain_dnf() -> DnfTable {
        dnf_table(vec![Tier::catch_all(DnfTier {
            race_dnf_probability: 1.0,
        })])
        .unwrap()
    }

    #[test]
    fn test_noise_sigma_ramp() {
        assert!((noise_sigma(0) - 0.005).abs() < 1e-12);
        assert!((noise_sigma(41) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_noise_is_right_skewed() {
        let mut rng = StdRng::seed_from_u64(99);
        let samples: Vec<f64> = (0..20_000).map(|_| sample_noise(41, &mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        // Expected mean = 0.2 * 2.5 * 0.025
        assert!((mean - 0.0125).abs() < 0.002, "mean {mean}");

        let max = samples.iter().cloned().fold(f64::MIN, f64::max);
        let min = samples.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max > -min, "max {max}, min {min}");
    }

    #[test]
    fn test_race_states() {
        let sim = RaceSimulator::default();
        let ctx = sim.context(SAWE_PB, &seeded(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            match ctx.run_race(&mut rng) {
                RaceOutcome::Finished {
                    splits,
                    fatigue_coefficient,
                } => {
                    assert_eq!(fatigue_coefficient, 0.0008);
                    assert!(splits.iter().all(|s| *s > 0.0));
                }
                RaceOutcome::Abandoned { at_km, .. } => {
                    assert!((31..=42).contains(&at_km));
                }
            }
        }

        let ctx = RaceSimulator::default()
            .with_dnf_tiers(certain_dnf())
            .context(SAWE_PB, &seeded(1))
            .unwrap();
        let outcome = ctx.run_race(&mut rng);
        assert_eq!(outcome.finish_time(), None);
        assert!(matches!(outcome, RaceOutcome::Abandoned { at_km: 31, .. }));
    }

    #[test]
    fn test_custom_fatigue_tiers() {
        let fixed_median = |median_coefficient| {
            fatigue_table(vec![Tier::catch_all(FatigueTier {
                median_coefficient,
                sigma: 0.0,
            })])
            .unwrap()
        };
        let sampled = SimulationConfig::default()
            .with_seed(8)
            .with_simulations(2_000);

        // With no spread every race draws the tier median
        let ctx = RaceSimulator::default()
            .with_fatigue_tiers(fixed_median(0.003))
            .context(SAWE_PB, &sampled)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let coeff = match ctx.run_race(&mut rng) {
                RaceOutcome::Finished {
                    fatigue_coefficient,
                    ..
                }
                | RaceOutcome::Abandoned {
                    fatigue_coefficient,
                    ..
                } => fatigue_coefficient,
            };
            assert!((coeff - 0.003).abs() < 1e-15, "coeff {coeff}");
        }

        let via_table = RaceSimulator::default()
            .with_fatigue_tiers(fixed_median(0.003))
            .simulate(SAWE_PB, &sampled)
            .unwrap();
        let via_override = RaceSimulator::default()
            .simulate(SAWE_PB, &sampled.clone().with_fatigue_coeff(0.003))
            .unwrap();
        let drift = (via_table.mean_time - via_override.mean_time).abs() / via_override.mean_time;
        assert!(drift < 0.005, "drift {drift}");

        let harsher = RaceSimulator::default()
            .with_fatigue_tiers(fixed_median(0.02))
            .simulate(SAWE_PB, &sampled)
            .unwrap();
        assert!(harsher.median > via_table.median);
    }

    #[test]
    fn test_single_race_against_pb() {
        let sim = RaceSimulator::default();
        // A single race may DNF; take the first seed that finishes
        let result = (0..100)
            .map(|seed| {
                let config = SimulationConfig::default()
                    .with_seed(seed)
                    .with_fatigue_coeff(0.0008)
                    .with_simulations(1);
                sim.simulate(SAWE_PB, &config).unwrap()
            })
            .find(|r| r.finishers == 1)
            .unwrap();

        assert!(result.mean_time > SAWE_PB, "{} <= {SAWE_PB}", result.mean_time);
        assert_eq!(result.mean_splits.len(), 42);
        let total: f64 = result.mean_splits.iter().sum();
        assert!((total - result.mean_time).abs() < 1e-6);
        assert_eq!(result.median, result.mean_time);
        assert_eq!(result.std_dev, 0.0);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let sim = RaceSimulator::default();
        let a = sim.simulate(SAWE_PB, &seeded(2026)).unwrap();
        let b = sim.simulate(SAWE_PB, &seeded(2026)).unwrap();
        assert_eq!(a, b);

        let c = sim.simulate(SAWE_PB, &seeded(2027)).unwrap();
        assert_ne!(a.mean_time, c.mean_time);
    }

    #[test]
    fn test_thread_count_does_not_change_result() {
        let sim = RaceSimulator::default();
        let single = sim.simulate(SAWE_PB, &seeded(11).with_threads(1)).unwrap();
        let multi = sim.simulate(SAWE_PB, &seeded(11).with_threads(4)).unwrap();
        let global = sim.simulate(SAWE_PB, &seeded(11)).unwrap();
        assert_eq!(single, multi);
        assert_eq!(single, global);
    }

    #[test]
    fn test_heat_slows_the_field() {
        let sim = RaceSimulator::default();
        let mild = sim.simulate(SAWE_PB, &seeded(3).with_temp(15.0)).unwrap();
        let hot = sim.simulate(SAWE_PB, &seeded(3).with_temp(30.0)).unwrap();
        assert!(hot.mean_time > mild.mean_time);
        assert_eq!(hot.dnf_count, mild.dnf_count);
        assert_eq!(hot.temp_celsius, 30.0);
    }

    #[test]
    fn test_aggregate_shape() {
        let result = RaceSimulator::default()
            .simulate(SAWE_PB, &seeded(8).with_simulations(5_000))
            .unwrap();

        assert_eq!(result.simulations, 5_000);
        assert_eq!(result.finishers + result.dnf_count, 5_000);
        assert!((result.dnf_rate - 0.03).abs() < 0.015, "dnf {}", result.dnf_rate);
        assert!(result.p5 <= result.p25);
        assert!(result.p25 <= result.median);
        assert!(result.median <= result.p75);
        assert!(result.p75 <= result.p95);
        assert!(result.std_dev > 0.0);
        assert_eq!(result.mean_splits.len(), 42);
        // Late kilometres are slower once fatigue kicks in
        assert!(result.mean_splits[41] > result.mean_splits[10]);
    }

    #[test]
    fn test_sampled_fatigue_mode() {
        let config = SimulationConfig::default()
            .with_seed(17)
            .with_simulations(3_000);
        let result = RaceSimulator::default().simulate(SAWE_PB, &config).unwrap();
        assert!(result.finishers > 2_500);
        assert!(result.median > 7_300.0 && result.median < 7_700.0, "{}", result.median);
        // Log-normal blow-ups stretch the right tail
        assert!(result.p95 - result.median > result.median - result.p5);
    }

    #[test]
    fn test_zero_finishers() {
        let sim = RaceSimulator::default().with_dnf_tiers(certain_dnf());
        let result = sim.simulate(SAWE_PB, &seeded(4).with_simulations(300)).unwrap();

        assert_eq!(result.finishers, 0);
        assert_eq!(result.dnf_count, 300);
        assert_eq!(result.dnf_rate, 1.0);
        assert!(result.mean_time.is_infinite());
        for v in [result.median, result.p5, result.p25, result.p75, result.p95, result.std_dev] {
            assert_eq!(v, 0.0);
        }
        assert!(result.mean_splits.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let sim = RaceSimulator::default();
        for pb in [0.0, -7325.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sim.simulate(pb, &seeded(1)),
                Err(AppError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            sim.simulate(SAWE_PB, &seeded(1).with_simulations(0)),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cancelled_run_has_no_result() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result =
            RaceSimulator::default().simulate_cancellable(SAWE_PB, &seeded(1), &cancel);
        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[test]
    fn test_simulate_entry_point() {
        let result = simulate(SAWE_PB, 15.0, Some(0.0008), 600).unwrap();
        assert_eq!(result.simulations, 600);
        assert_eq!(result.temp_celsius, 15.0);
        assert!(result.mean_time > SAWE_PB);
    }

    #[test]
    fn test_chunk_seeds_differ() {
        assert_ne!(chunk_seed(42, 0), chunk_seed(42, 1));
        assert_ne!(chunk_seed(42, 0), chunk_seed(43, 0));
    }
}
