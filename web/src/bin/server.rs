//! Booking API server.
//!
//! Run with: cargo run -p booking-web --bin server
//! API: http://localhost:8080/api
//! Health: http://localhost:8080/health
//! Metrics: http://localhost:9090/metrics

use anyhow::{Context, Result};
use booking_web::{Config, bootstrap, metrics, routes};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    info!("Starting booking server");

    let prometheus = metrics::install_recorder()?;
    let state = bootstrap::production_state(&config).await?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let api_addr = config.server.addr()?;
    let api_listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind {api_addr}"))?;
    let mut api_shutdown = shutdown_tx.subscribe();
    let api = tokio::spawn(async move {
        axum::serve(api_listener, routes::router(state))
            .with_graceful_shutdown(async move {
                let _ = api_shutdown.recv().await;
            })
            .await
    });
    info!(addr = %api_addr, "API listening");

    let metrics_addr = config.metrics.addr()?;
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("failed to bind {metrics_addr}"))?;
    let mut metrics_shutdown = shutdown_tx.subscribe();
    let metrics_server = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics::metrics_router(prometheus))
            .with_graceful_shutdown(async move {
                let _ = metrics_shutdown.recv().await;
            })
            .await
    });
    info!(addr = %metrics_addr, "Prometheus metrics available at /metrics");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!(error = %err, "Unable to listen for shutdown signal"),
    }
    let _ = shutdown_tx.send(());

    for (name, task) in [("API", api), ("metrics", metrics_server)] {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(server = name, error = %e, "Server error during shutdown"),
            Err(e) => warn!(server = name, error = %e, "Server task failed"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,booking_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
