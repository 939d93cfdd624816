//! Error taxonomy for the fusion pipeline.
//!
//! Four failure classes with different blast radii: model loading aborts
//! startup, inference failures surface to the API caller, external-source
//! failures cause the watcher to skip and retry, and snapshot persistence
//! failures are logged while the in-memory store stays authoritative.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A scoring artifact is missing or unreadable. Fatal to startup: the
/// pipeline never runs with a partial model set.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {path}")]
    Missing { path: String },

    #[error("failed to read model artifact {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model artifact {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("onnx runtime failed for {path}")]
    Onnx {
        path: String,
        #[source]
        source: ort::Error,
    },
}

/// A scorer rejected its input or produced a pathological output.
/// Request-scoped: surfaced to the caller, never retried internally.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("feature vector shape mismatch: model {model} expects {expected} features, got {actual}")]
    FeatureShape {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("non-finite value in feature vector for model {model}")]
    NonFiniteInput { model: String },

    #[error("model {model} produced a non-finite probability")]
    NonFiniteOutput { model: String },

    #[error("model {model} returned no usable probability output")]
    MissingOutput { model: String },

    #[error("model {model} session is unusable")]
    Poisoned { model: String },

    #[error("model session failed")]
    Session(#[from] ort::Error),
}

/// The mailbox or the serving endpoint could not be reached or answered
/// badly. Never fatal: the current event or cycle is skipped and retried.
#[derive(Debug, Error)]
pub enum ExternalSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("unparseable response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ExternalSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Writing the latest-decision snapshot to disk failed. Non-fatal: the
/// decision is still held in memory and served from there.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to serialize decision snapshot")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write decision snapshot")]
    Io(#[from] std::io::Error),
}

/// Request-level error surface of the serving endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Inference(err) => {
                tracing::error!(error = %err, "inference failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_the_code_visible() {
        let err = ExternalSourceError::Status(503);
        assert_eq!(err.to_string(), "remote returned status 503");
    }

    #[test]
    fn shape_mismatch_names_the_model() {
        let err = InferenceError::FeatureShape {
            model: "tx".to_string(),
            expected: 6,
            actual: 4,
        };
        assert!(err.to_string().contains("tx"));
        assert!(err.to_string().contains('6'));
    }
}
