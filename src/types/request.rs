//! Wire schema of the prediction request.

use serde::{Deserialize, Serialize};

use super::{CommunicationFeatures, TransactionFeatures};

/// Flat request payload for `POST /predict`: all ten numeric fields are
/// required and unknown fields are rejected at the boundary.
///
/// The supplied `communication_score` is accepted for schema completeness
/// but is derived state; validation rebuilds the communication vector and
/// recomputes it from the other three fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictRequest {
    pub amount: f64,
    pub geo_mismatch: u8,
    pub is_new_device: u8,
    pub prior_tx_count_1h: u32,
    pub prior_tx_count_24h: u32,
    pub time_since_last_tx_min: f64,

    pub sentiment_score: f64,
    pub urgency_score: f64,
    pub is_manipulative: u8,
    pub communication_score: f64,
}

impl PredictRequest {
    /// Validate ranges and split into the two typed feature vectors.
    pub fn into_features(self) -> Result<(TransactionFeatures, CommunicationFeatures), String> {
        let tx = TransactionFeatures {
            amount: self.amount,
            geo_mismatch: self.geo_mismatch,
            is_new_device: self.is_new_device,
            prior_tx_count_1h: self.prior_tx_count_1h,
            prior_tx_count_24h: self.prior_tx_count_24h,
            time_since_last_tx_min: self.time_since_last_tx_min,
        };
        tx.validate()?;

        CommunicationFeatures::validate_ranges(
            self.sentiment_score,
            self.urgency_score,
            self.is_manipulative,
        )?;
        let comm =
            CommunicationFeatures::new(self.sentiment_score, self.urgency_score, self.is_manipulative);

        Ok((tx, comm))
    }

    /// Build the wire payload from already-typed features (watcher side).
    pub fn from_features(tx: &TransactionFeatures, comm: &CommunicationFeatures) -> Self {
        Self {
            amount: tx.amount,
            geo_mismatch: tx.geo_mismatch,
            is_new_device: tx.is_new_device,
            prior_tx_count_1h: tx.prior_tx_count_1h,
            prior_tx_count_24h: tx.prior_tx_count_24h,
            time_since_last_tx_min: tx.time_since_last_tx_min,
            sentiment_score: comm.sentiment_score,
            urgency_score: comm.urgency_score,
            is_manipulative: comm.is_manipulative,
            communication_score: comm.communication_score,
        }
    }
}
