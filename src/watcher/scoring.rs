//! Client side of the serving endpoint, as used by the watcher.

use crate::error::ExternalSourceError;
use crate::types::{CommunicationFeatures, Decision, PredictRequest, TransactionFeatures};

/// Submission seam between the watcher and the serving pipeline. The HTTP
/// implementation talks to `POST /predict`; tests inject a fake.
#[allow(async_fn_in_trait)]
pub trait ScoringClient {
    async fn submit(
        &self,
        tx: &TransactionFeatures,
        comm: &CommunicationFeatures,
    ) -> Result<Decision, ExternalSourceError>;
}

/// HTTP client posting event pairs to the serving endpoint.
pub struct HttpScoringClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpScoringClient {
    pub fn new(endpoint: &str, timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.to_string(),
            http,
        }
    }
}

impl ScoringClient for HttpScoringClient {
    async fn submit(
        &self,
        tx: &TransactionFeatures,
        comm: &CommunicationFeatures,
    ) -> Result<Decision, ExternalSourceError> {
        let payload = PredictRequest::from_features(tx, comm);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExternalSourceError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
