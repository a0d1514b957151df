//! Simulation and server configuration.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Historical average London Marathon race-day temperature.
pub const DEFAULT_TEMP_C: f64 = 15.0;
pub const DEFAULT_SIMULATIONS: usize = 10_000;

/// Inputs of a single simulation run besides the runner's calibre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ambient temperature in °C.
    pub temp_celsius: f64,
    /// Number of independent simulated races.
    pub simulations: usize,
    /// Fixed fatigue coefficient; `None` samples one per race by calibre.
    pub fatigue_coeff_override: Option<f64>,
    /// Base seed; `None` draws a fresh one.
    pub seed: Option<u64>,
    /// Worker threads; `None` uses the global pool.
    pub threads: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            temp_celsius: DEFAULT_TEMP_C,
            simulations: DEFAULT_SIMULATIONS,
            fatigue_coeff_override: None,
            seed: None,
            threads: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_temp(mut self, temp_celsius: f64) -> Self {
        self.temp_celsius = temp_celsius;
        self
    }

    pub fn with_simulations(mut self, simulations: usize) -> Self {
        self.simulations = simulations;
        self
    }

    pub fn with_fatigue_coeff(mut self, coeff: f64) -> Self {
        self.fatigue_coeff_override = Some(coeff);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Rejects inputs that would make a run meaningless.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.simulations == 0 {
            return Err(AppError::invalid("simulations must be positive"));
        }
        if !self.temp_celsius.is_finite() {
            return Err(AppError::invalid("temperature must be a finite number"));
        }
        if let Some(coeff) = self.fatigue_coeff_override
            && !(coeff.is_finite() && coeff >= 0.0)
        {
            return Err(AppError::invalid(format!(
                "fatigue coefficient must be non-negative, got {coeff}"
            )));
        }
        if self.threads == Some(0) {
            return Err(AppError::invalid("threads must be positive"));
        }
        Ok(())
    }
}

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// GPX track for the course profile; the London profile when absent.
    pub course_gpx: Option<PathBuf>,
    pub simulations: usize,
    pub leaderboard_simulations: usize,
    pub simulation_timeout: Duration,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3002,
            course_gpx: None,
            simulations: DEFAULT_SIMULATIONS,
            leaderboard_simulations: 2_000,
            simulation_timeout: Duration::from_secs(30),
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            course_gpx: env::var("COURSE_GPX").ok().map(PathBuf::from),
            simulations: env_or("SIMULATIONS", defaults.simulations),
            leaderboard_simulations: env_or(
                "LEADERBOARD_SIMULATIONS",
                defaults.leaderboard_simulations,
            ),
            simulation_timeout: Duration::from_secs(env_or(
                "SIMULATION_TIMEOUT_SECS",
                defaults.simulation_timeout.as_secs(),
            )),
            seed: env::var("SEED").ok().and_then(|s| s.parse().ok()),
        }
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {key}={raw:?}, using {default}");
            default
        }),
        Err(_) => default,
    }
}
