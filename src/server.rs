//! HTTP serving surface for the fusion pipeline.
//!
//! Three routes: `POST /predict` runs the full pipeline synchronously and
//! returns the decision, `GET /latest` exposes the alert store to
//! observers, and `GET /` is a constant liveness check.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::metrics::ServiceMetrics;
use crate::models::FusionEngine;
use crate::store::{persist_snapshot, AlertStore};
use crate::types::{Decision, PredictRequest};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub store: Arc<AlertStore>,
    pub metrics: Arc<ServiceMetrics>,
    /// Best-effort snapshot target; `None` disables persistence.
    pub snapshot_path: Option<PathBuf>,
}

/// Build the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/latest", get(latest))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Liveness/identity check.
async fn root() -> Json<Value> {
    Json(json!({
        "message": "Social-engineering fraud fusion service is running."
    }))
}

/// Current alert store contents, or an empty object while waiting for the
/// first decision.
async fn latest(State(state): State<AppState>) -> Json<Value> {
    match state.store.get() {
        Some(decision) => {
            Json(serde_json::to_value(decision.as_ref()).unwrap_or_else(|_| json!({})))
        }
        None => Json(json!({})),
    }
}

/// Run the full pipeline for one event pair and publish the decision to
/// the alert store.
async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<Decision>, ApiError> {
    let started = Instant::now();

    let (tx, comm) = request.into_features().map_err(ApiError::Validation)?;
    let decision = state.engine.predict(&tx, &comm)?;

    state
        .metrics
        .record_request(started.elapsed(), decision.fraud_probability);
    state.metrics.record_decision(decision.decision);

    // Publish before responding so observers see the decision no later
    // than the caller does.
    state.store.set(decision.clone());

    if let Some(path) = &state.snapshot_path {
        if let Err(e) = persist_snapshot(path, &decision) {
            warn!(path = %path.display(), error = %e, "Snapshot persistence failed; in-memory store still updated");
        }
    }

    info!(
        fraud_probability = decision.fraud_probability,
        decision = ?decision.decision,
        processing_time_us = started.elapsed().as_micros(),
        "Decision published"
    );

    Ok(Json(decision))
}
