use predictor::{ServerConfig, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = ServerConfig::from_env();
    tracing::info!(
        port = config.port,
        simulations = config.simulations,
        leaderboard_simulations = config.leaderboard_simulations,
        timeout_secs = config.simulation_timeout.as_secs(),
        "Starting predictor"
    );

    run_server(config).await
}
