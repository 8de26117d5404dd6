use anyhow::{Context, Result};
use fivetran_exporter::api::create_metrics_router;
use fivetran_exporter::config::ExporterConfig;
use fivetran_exporter::exporter;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fivetran_exporter=info".into()),
        )
        .init();

    info!("Fivetran exporter starting...");

    let config = ExporterConfig::from_env().context("Failed to load configuration")?;
    info!(
        api_url = %config.api_url,
        groups = ?config.group_names,
        timeout = ?config.api_call_timeout,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );

    let exporter = Arc::new(
        exporter::build(&config)
            .await
            .context("Failed to initialize exporter")?,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Serving metrics");

    let app = create_metrics_router(Arc::clone(&exporter));
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics server error");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    exporter.shutdown();

    info!("Fivetran exporter stopped");
    Ok(())
}
