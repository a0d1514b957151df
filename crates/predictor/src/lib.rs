//! Marathon finish-time prediction.
//!
//! The core is a Monte Carlo race simulator ([`simulation`]) that times each
//! kilometre of the course from a runner's personal best, a course profile,
//! a late-race fatigue model, a heat model, per-km noise and a DNF hazard.
//! The HTTP layer ([`create_router`]) exposes single-runner predictions and
//! a ranked leaderboard for the elite field.

pub mod config;
pub mod course;
pub mod dnf;
pub mod errors;
pub mod fatigue;
pub mod handlers;
pub mod heat;
pub mod leaderboard;
pub mod runners;
pub mod simulation;
pub mod stats;
pub mod tiers;
pub mod timefmt;
pub mod types;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub use crate::{
    config::{ServerConfig, SimulationConfig},
    course::{CourseProfile, course_profile},
    errors::AppError,
    simulation::{CancelToken, RaceSimulator, simulate},
    stats::AggregateResult,
};
use crate::handlers::{AppState, get_course, get_leaderboard, health_check, list_runners, predict};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/predict", get(predict).post(predict))
        .route("/runners", get(list_runners))
        .route("/leaderboard", get(get_leaderboard))
        .route("/course", get(get_course))
        .layer(Extension(state))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Loads the course named by the config, falling back to London.
pub fn load_state(config: ServerConfig) -> Result<AppState, AppError> {
    let (course, source) = match &config.course_gpx {
        Some(path) => {
            tracing::info!("Loading course profile from {}", path.display());
            (
                CourseProfile::from_gpx_file(path)?,
                path.display().to_string(),
            )
        }
        None => (CourseProfile::london(), "london".to_string()),
    };

    Ok(AppState::new(RaceSimulator::new(course), &source, config))
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let port = config.port;
    let app = create_router(load_state(config)?);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
