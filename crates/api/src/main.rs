use anyhow::{Context, Result};
use api::{AppConfig, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Local development convenience; real deployments set the environment directly
    dotenv::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    api::telemetry::init_tracing(&config.logging)?;

    let state = Arc::new(AppState::from_config(&config)?);
    let app = api::router(state, &config.server);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(
        address = %address,
        model = %config.llm.model,
        llm_base_url = %config.llm.base_url,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
