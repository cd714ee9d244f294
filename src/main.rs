use std::sync::Arc;
use std::time::Duration;

use hotpot_console::api::client::HttpConsoleApi;
use hotpot_console::api::rest;
use hotpot_console::config::Config;
use hotpot_console::error::ConsoleError;
use hotpot_console::state::{self, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let api = Arc::new(HttpConsoleApi::from_config(&config)?);
    let app_state = AppState::new(
        api.clone(),
        api,
        config.default_page_size,
        config.event_buffer_size,
    );
    let shared_state = Arc::new(app_state);

    let board = shared_state.board.clone();
    tokio::spawn(async move {
        if !board.fetch_data().await {
            tracing::warn!("initial order load failed; waiting for a manual refresh");
        }
    });

    tokio::spawn(state::run_dialog_sweeper(
        shared_state.clone(),
        Duration::from_secs(config.dialog_ttl_secs),
    ));

    let app = rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| ConsoleError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        backend = %config.api_base_url,
        "console server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| ConsoleError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
