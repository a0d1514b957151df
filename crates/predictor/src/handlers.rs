//! HTTP request handlers for the prediction API.

use std::sync::Arc;

use axum::{Extension, extract::Query, response::Json};
use tracing::warn;

use crate::{
    config::{DEFAULT_TEMP_C, ServerConfig, SimulationConfig},
    errors::AppError,
    leaderboard::predict_field,
    runners::{Runner, elite_field},
    simulation::{CancelToken, RaceSimulator},
    timefmt::parse_hms,
    types::{
        CourseResponse, LeaderboardQuery, LeaderboardRow, PredictQuery, PredictionResponse,
        RunnerResponse,
    },
};

/// Shared, read-only state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub simulator: Arc<RaceSimulator>,
    /// Where the course profile came from ("london" or a GPX path).
    pub course_source: Arc<str>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(simulator: RaceSimulator, course_source: &str, config: ServerConfig) -> Self {
        Self {
            simulator: Arc::new(simulator),
            course_source: Arc::from(course_source),
            config: Arc::new(config),
        }
    }
}

/// Runs a simulation job off the async runtime, cancelling it if it
/// outlives the configured timeout.
async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&RaceSimulator, &CancelToken) -> Result<T, AppError> + Send + 'static,
{
    let cancel = CancelToken::new();
    let simulator = state.simulator.clone();
    let token = cancel.clone();
    let task = tokio::task::spawn_blocking(move || job(&simulator, &token));

    match tokio::time::timeout(state.config.simulation_timeout, task).await {
        Ok(joined) => joined?,
        Err(_) => {
            cancel.cancel();
            warn!(
                timeout_secs = state.config.simulation_timeout.as_secs_f64(),
                "Simulation timed out"
            );
            Err(AppError::Cancelled)
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Predicts the finish-time distribution for one personal best.
pub async fn predict(
    Extension(state): Extension<AppState>,
    Query(query): Query<PredictQuery>,
) -> Result<Json<PredictionResponse>, AppError> {
    let pb_seconds = parse_hms(&query.pb_time)?;
    let config = SimulationConfig {
        temp_celsius: query.temp_celsius.unwrap_or(DEFAULT_TEMP_C),
        simulations: query.simulations.unwrap_or(state.config.simulations),
        fatigue_coeff_override: query.fatigue_coeff,
        seed: query.seed.or(state.config.seed),
        threads: None,
    };
    config.validate()?;

    let result = run_blocking(&state, move |sim, cancel| {
        sim.simulate_cancellable(pb_seconds, &config, cancel)
    })
    .await?;

    Ok(Json(PredictionResponse::from(&result)))
}

/// Lists the elite field.
pub async fn list_runners() -> Result<Json<Vec<RunnerResponse>>, AppError> {
    let runners = elite_field()?;
    Ok(Json(runners.iter().map(RunnerResponse::from).collect()))
}

/// Predicts and ranks the whole elite field.
pub async fn get_leaderboard(
    Extension(state): Extension<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardRow>>, AppError> {
    let runners: Vec<Runner> = elite_field()?;
    let config = SimulationConfig {
        temp_celsius: query.temp_celsius.unwrap_or(DEFAULT_TEMP_C),
        simulations: query
            .simulations
            .unwrap_or(state.config.leaderboard_simulations),
        fatigue_coeff_override: None,
        seed: query.seed.or(state.config.seed),
        threads: None,
    };
    config.validate()?;

    let board = run_blocking(&state, move |sim, cancel| {
        predict_field(sim, &runners, &config, cancel)
    })
    .await?;

    Ok(Json(LeaderboardRow::from_ranked(&board)))
}

/// Returns the course profile in use.
pub async fn get_course(Extension(state): Extension<AppState>) -> Json<CourseResponse> {
    Json(CourseResponse {
        source: state.course_source.to_string(),
        multipliers: state.simulator.course().multipliers().to_vec(),
    })
}
