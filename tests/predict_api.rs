//! End-to-end tests of the serving surface.
//!
//! The engine runs on linear stand-in models with hand-picked
//! coefficients; the real tree ensemble needs an artifact on disk and is
//! only exercised by the server binary at startup.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use fraud_fusion_pipeline::{
    metrics::ServiceMetrics,
    models::{FusionEngine, LinearScorer},
    AlertStore, AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_engine() -> FusionEngine {
    FusionEngine::from_parts(
        Box::new(LinearScorer::new(
            "transaction",
            vec![0.00005, 1.2, 1.0, 0.3, 0.08, -0.004],
            -3.0,
        )),
        Box::new(LinearScorer::new(
            "communication",
            vec![-1.5, 4.0, 1.0, 3.0],
            -2.5,
        )),
        Box::new(LinearScorer::new("fusion", vec![3.0, 3.0], -3.2)),
    )
}

fn test_app(snapshot_path: Option<PathBuf>) -> (Router, Arc<AlertStore>) {
    let store = Arc::new(AlertStore::new());
    let state = AppState {
        engine: Arc::new(test_engine()),
        store: store.clone(),
        metrics: Arc::new(ServiceMetrics::new()),
        snapshot_path,
    };
    (fraud_fusion_pipeline::create_router(state), store)
}

fn low_risk_payload() -> Value {
    json!({
        "amount": 500.0,
        "geo_mismatch": 0,
        "is_new_device": 0,
        "prior_tx_count_1h": 1,
        "prior_tx_count_24h": 3,
        "time_since_last_tx_min": 120.0,
        "sentiment_score": 0.2,
        "urgency_score": 0.0,
        "is_manipulative": 0,
        "communication_score": 0.06
    })
}

fn high_risk_payload() -> Value {
    json!({
        "amount": 95000.0,
        "geo_mismatch": 1,
        "is_new_device": 1,
        "prior_tx_count_1h": 5,
        "prior_tx_count_24h": 18,
        "time_since_last_tx_min": 1.0,
        "sentiment_score": -0.6,
        "urgency_score": 0.8,
        "is_manipulative": 1,
        "communication_score": 0.12
    })
}

async fn post_predict(app: &Router, payload: &Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn root_is_a_constant_liveness_check() {
    let (app, _) = test_app(None);
    let (status, body) = get_json(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn latest_is_empty_before_the_first_decision() {
    let (app, _) = test_app(None);
    let (status, body) = get_json(&app, "/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn benign_pair_is_labeled_low_risk() {
    let (app, _) = test_app(None);
    let (status, body) = post_predict(&app, &low_risk_payload()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["transaction_risk"].as_f64().unwrap() < 0.5);
    assert!(body["communication_risk"].as_f64().unwrap() < 0.5);
    assert!(body["fraud_probability"].as_f64().unwrap() <= 0.5);
    assert_eq!(body["decision"], "Low risk");
    // Inputs are echoed back.
    assert_eq!(body["amount"], 500.0);
    assert_eq!(body["communication_score"], 0.06);
}

#[tokio::test]
async fn hostile_pair_is_labeled_by_the_threshold_rule() {
    let (app, _) = test_app(None);
    let (status, body) = post_predict(&app, &high_risk_payload()).await;

    assert_eq!(status, StatusCode::OK);
    let fraud_probability = body["fraud_probability"].as_f64().unwrap();
    assert!(fraud_probability > 0.5);
    let expected = if fraud_probability > 0.5 {
        "High risk of social engineering"
    } else {
        "Low risk"
    };
    assert_eq!(body["decision"], expected);
}

#[tokio::test]
async fn identical_requests_yield_identical_decisions() {
    let (app, _) = test_app(None);
    let (_, first) = post_predict(&app, &high_risk_payload()).await;
    let (_, second) = post_predict(&app, &high_risk_payload()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn latest_tracks_the_most_recent_decision_only() {
    let (app, _) = test_app(None);

    let (_, low) = post_predict(&app, &low_risk_payload()).await;
    let (_, after_first) = get_json(&app, "/latest").await;
    assert_eq!(after_first, low);

    let (_, high) = post_predict(&app, &high_risk_payload()).await;
    let (_, after_second) = get_json(&app, "/latest").await;
    // Exactly the second decision, never a merge.
    assert_eq!(after_second, high);
    assert_ne!(after_second, low);
}

#[tokio::test]
async fn out_of_range_fields_are_rejected_with_400() {
    let (app, store) = test_app(None);

    let mut payload = low_risk_payload();
    payload["geo_mismatch"] = json!(3);
    let (status, body) = post_predict(&app, &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("geo_mismatch"));
    // A rejected request never reaches the store.
    assert!(store.get().is_none());
}

#[tokio::test]
async fn unknown_and_missing_fields_are_rejected() {
    let (app, _) = test_app(None);

    let mut payload = low_risk_payload();
    payload["surprise"] = json!(1);
    let (status, _) = post_predict(&app, &payload).await;
    assert!(status.is_client_error());

    let mut payload = low_risk_payload();
    payload.as_object_mut().unwrap().remove("amount");
    let (status, _) = post_predict(&app, &payload).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn supplied_composite_score_is_recomputed() {
    let (app, _) = test_app(None);

    let mut payload = high_risk_payload();
    // Wire value disagrees with the fixed formula; the decision must echo
    // the recomputed composite: 0.6*0.8 + 0.3*(-0.6) + 0.1*1 = 0.40.
    payload["communication_score"] = json!(0.12);
    let (_, body) = post_predict(&app, &payload).await;
    assert_eq!(body["communication_score"], 0.4);
}

#[tokio::test]
async fn decisions_are_snapshotted_to_disk_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest_output.json");
    let (app, _) = test_app(Some(path.clone()));

    let (_, body) = post_predict(&app, &low_risk_payload()).await;

    let raw = std::fs::read(&path).unwrap();
    let snapshot: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(snapshot, body);
}
