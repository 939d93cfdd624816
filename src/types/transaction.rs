//! Transaction-side feature vector.

use serde::{Deserialize, Serialize};

/// The six transaction features, in the exact order the transaction model
/// was trained on. Field order here *is* the model input order; reordering
/// fields silently corrupts scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFeatures {
    /// Transaction amount in currency units.
    pub amount: f64,

    /// 1 when the transaction location disagrees with the account's usual
    /// geography, else 0.
    pub geo_mismatch: u8,

    /// 1 when the transaction comes from a device not seen before, else 0.
    pub is_new_device: u8,

    /// Transactions on the account in the last hour.
    pub prior_tx_count_1h: u32,

    /// Transactions on the account in the last 24 hours.
    pub prior_tx_count_24h: u32,

    /// Minutes since the previous transaction.
    pub time_since_last_tx_min: f64,
}

impl TransactionFeatures {
    /// Number of features the transaction model consumes.
    pub const FEATURE_COUNT: usize = 6;

    /// Validate numeric ranges. Flags must be 0/1, amounts and durations
    /// non-negative and finite.
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(format!("amount must be a non-negative number, got {}", self.amount));
        }
        if self.geo_mismatch > 1 {
            return Err(format!("geo_mismatch must be 0 or 1, got {}", self.geo_mismatch));
        }
        if self.is_new_device > 1 {
            return Err(format!("is_new_device must be 0 or 1, got {}", self.is_new_device));
        }
        if !self.time_since_last_tx_min.is_finite() || self.time_since_last_tx_min < 0.0 {
            return Err(format!(
                "time_since_last_tx_min must be a non-negative number, got {}",
                self.time_since_last_tx_min
            ));
        }
        Ok(())
    }

    /// Model input vector, in training order.
    pub fn to_feature_vec(&self) -> Vec<f32> {
        vec![
            self.amount as f32,
            f32::from(self.geo_mismatch),
            f32::from(self.is_new_device),
            self.prior_tx_count_1h as f32,
            self.prior_tx_count_24h as f32,
            self.time_since_last_tx_min as f32,
        ]
    }
}
