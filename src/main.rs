use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;

use forumhub::forumhub_config::AppConfig;
use forumhub::logging::init_tracing;
use forumhub::metrics::init_metrics;
use forumhub::router::init_router;
use forumhub::state::init_app_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("Failed to initialize tracing")?;

    let config = AppConfig::from_env();
    let metrics_handle = init_metrics().context("Failed to install metrics recorder")?;
    let state = init_app_state(&config).await?;
    let app = init_router(state, metrics_handle);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(address = %address, "Server running");
    info!("OpenAPI document at http://{}/api-docs/openapi.json", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
