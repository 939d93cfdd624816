//! Communication-side feature vector.

use serde::{Deserialize, Serialize};

use super::round_to;

/// Weight of the urgency score in the composite.
pub const URGENCY_WEIGHT: f64 = 0.6;
/// Weight of the sentiment score in the composite.
pub const SENTIMENT_WEIGHT: f64 = 0.3;
/// Weight of the manipulation flag in the composite.
pub const MANIPULATION_WEIGHT: f64 = 0.1;

/// Decimal places kept on the communication features.
pub const FEATURE_PRECISION: i32 = 4;

/// The four communication features, in the exact order the communication
/// model was trained on.
///
/// `communication_score` is derived state: the only constructor recomputes
/// it from the other three fields with the fixed linear combination. It is
/// never accepted from outside independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationFeatures {
    /// Lexicon polarity of the message, in [-1, 1].
    pub sentiment_score: f64,

    /// Fraction of the urgency keyword set present in the message, in [0, 1].
    pub urgency_score: f64,

    /// 1 when a manipulation keyword is present, else 0.
    pub is_manipulative: u8,

    /// Weighted composite of the three fields above.
    pub communication_score: f64,
}

impl CommunicationFeatures {
    /// Number of features the communication model consumes.
    pub const FEATURE_COUNT: usize = 4;

    /// Build the feature vector, rounding the inputs to the fixed precision
    /// and recomputing the composite from the rounded fields so that the
    /// stored values satisfy the composite formula exactly.
    pub fn new(sentiment_score: f64, urgency_score: f64, is_manipulative: u8) -> Self {
        let sentiment_score = round_to(sentiment_score, FEATURE_PRECISION);
        let urgency_score = round_to(urgency_score, FEATURE_PRECISION);
        let communication_score = round_to(
            URGENCY_WEIGHT * urgency_score
                + SENTIMENT_WEIGHT * sentiment_score
                + MANIPULATION_WEIGHT * f64::from(is_manipulative),
            FEATURE_PRECISION,
        );

        Self {
            sentiment_score,
            urgency_score,
            is_manipulative,
            communication_score,
        }
    }

    /// Validate the request-supplied ranges before the vector is rebuilt
    /// through [`CommunicationFeatures::new`].
    pub fn validate_ranges(sentiment_score: f64, urgency_score: f64, is_manipulative: u8) -> Result<(), String> {
        if !sentiment_score.is_finite() || !(-1.0..=1.0).contains(&sentiment_score) {
            return Err(format!("sentiment_score must be in [-1, 1], got {sentiment_score}"));
        }
        if !urgency_score.is_finite() || !(0.0..=1.0).contains(&urgency_score) {
            return Err(format!("urgency_score must be in [0, 1], got {urgency_score}"));
        }
        if is_manipulative > 1 {
            return Err(format!("is_manipulative must be 0 or 1, got {is_manipulative}"));
        }
        Ok(())
    }

    /// Model input vector, in training order.
    pub fn to_feature_vec(&self) -> Vec<f32> {
        vec![
            self.sentiment_score as f32,
            self.urgency_score as f32,
            f32::from(self.is_manipulative),
            self.communication_score as f32,
        ]
    }
}
