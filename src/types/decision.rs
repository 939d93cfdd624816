//! Decision record: the full result of one pipeline invocation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{round_to, CommunicationFeatures, TransactionFeatures};

/// Fraud probabilities strictly above this are labeled high risk.
/// A probability of exactly 0.5 is low risk.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Decimal places kept on the three risk fields of a [`Decision`].
pub const RISK_PRECISION: i32 = 3;

/// Binary decision label attached to every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionLabel {
    #[serde(rename = "High risk of social engineering")]
    HighRisk,
    #[serde(rename = "Low risk")]
    LowRisk,
}

impl DecisionLabel {
    /// Classify an *unrounded* fused probability.
    pub fn from_probability(fraud_probability: f64) -> Self {
        if fraud_probability > DECISION_THRESHOLD {
            Self::HighRisk
        } else {
            Self::LowRisk
        }
    }
}

/// One complete pipeline result: echoed inputs, the three risk scores
/// (rounded for display stability), and the decision label.
///
/// Deliberately carries no generated id or timestamp: the serving endpoint
/// is a pure function of its input and the loaded models, so two identical
/// requests produce byte-identical decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    // Transaction input echo
    pub amount: f64,
    pub geo_mismatch: u8,
    pub is_new_device: u8,
    pub prior_tx_count_1h: u32,
    pub prior_tx_count_24h: u32,
    pub time_since_last_tx_min: f64,

    // Communication input echo
    pub sentiment_score: f64,
    pub urgency_score: f64,
    pub is_manipulative: u8,
    pub communication_score: f64,

    // Scores
    pub transaction_risk: f64,
    pub communication_risk: f64,
    pub fraud_probability: f64,

    pub decision: DecisionLabel,
}

impl Decision {
    /// Assemble a decision from the inputs and the unrounded model outputs.
    /// The label is computed from the unrounded probability; the stored
    /// risk fields are rounded to [`RISK_PRECISION`] places.
    pub fn build(
        tx: &TransactionFeatures,
        comm: &CommunicationFeatures,
        transaction_risk: f64,
        communication_risk: f64,
        fraud_probability: f64,
    ) -> Self {
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

            transaction_risk: round_to(transaction_risk, RISK_PRECISION),
            communication_risk: round_to(communication_risk, RISK_PRECISION),
            fraud_probability: round_to(fraud_probability, RISK_PRECISION),

            decision: DecisionLabel::from_probability(fraud_probability),
        }
    }

    /// Stable content fingerprint over every field: SHA-256 of the canonical
    /// JSON serialization. Used by consumers to dedupe repeated reads of the
    /// same store snapshot.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }
}
