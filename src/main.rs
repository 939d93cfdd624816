//! Fusion serving API - main entry point.
//!
//! Loads the three scoring models, clears the alert store, and serves the
//! prediction and latest-decision endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use fraud_fusion_pipeline::{
    config::AppConfig,
    create_router,
    metrics::{MetricsReporter, ServiceMetrics},
    store::remove_stale_snapshot,
    AlertStore, AppState, FusionEngine,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_fusion_pipeline=info".parse()?)
                .add_directive("fusion_server=info".parse()?),
        )
        .init();

    info!("Starting fusion serving API");

    let config = AppConfig::load()?;
    info!(
        models_dir = %config.models.models_dir,
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // Fail fast: no partial-pipeline operation with a missing model.
    let engine = Arc::new(FusionEngine::load(&config.models).context("Failed to load scoring models")?);

    // Startup invariant: a restarted server never serves a decision from a
    // previous incarnation, in memory or on disk.
    let store = Arc::new(AlertStore::new());
    store.clear();
    let snapshot_path = PathBuf::from(&config.server.snapshot_path);
    remove_stale_snapshot(&snapshot_path);
    info!("Alert store cleared; observers wait for the first decision");

    let metrics = Arc::new(ServiceMetrics::new());
    let reporter = MetricsReporter::new(metrics.clone(), 30);
    tokio::spawn(reporter.start());

    let state = AppState {
        engine,
        store,
        metrics,
        snapshot_path: Some(snapshot_path),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Serving");

    axum::serve(listener, app).await.context("Server exited")?;

    Ok(())
}
