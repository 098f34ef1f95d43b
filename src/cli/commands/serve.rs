use anyhow::Context;

use crate::app::app;
use crate::config::config;
use crate::state::AppState;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = config().clone();
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    tracing::info!("Starting Movies API in {:?} mode", config.environment);

    let addr = config.listen_addr()?;
    let state = AppState::from_config(config).await?;
    state.bootstrap_admin().await?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Movies API listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
