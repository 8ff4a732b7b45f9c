//! # stagepay-api — Binary Entry Point
//!
//! Starts the Axum HTTP server and the approval fan-out worker.
//! Binds to a configurable port (default 8080).

use stagepay_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;

    // Database pool is optional. Absent means in-memory only.
    let db_pool = stagepay_api::db::connect_from_env().await?;
    if let Some(pool) = &db_pool {
        stagepay_api::db::migrate(pool).await?;
    }

    let (state, receiver) = AppState::with_config(config, db_pool);
    state.hydrate_from_db().await?;

    // Approval fan-out worker. Runs for the lifetime of the process.
    let _worker = stagepay_api::jobs::spawn_worker(state.clone(), receiver);

    let app = stagepay_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("StagePay API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
