//! Model loading and risk scoring.

pub mod fusion;
pub mod linear;
pub mod onnx;

pub use fusion::FusionEngine;
pub use linear::LinearScorer;
pub use onnx::OnnxScorer;

use crate::error::InferenceError;

/// Uniform contract over the pre-trained classifiers: a probability of the
/// positive (fraud) class for one feature vector.
pub trait RiskScorer: Send + Sync {
    /// Short model name used in logs and errors.
    fn name(&self) -> &str;

    /// Feature vector length the model was trained on.
    fn feature_count(&self) -> usize;

    /// Score one feature vector. Purely read-only inference.
    fn score(&self, features: &[f32]) -> Result<f64, InferenceError>;
}

/// Shape and finiteness check run by every scorer before inference. The
/// length check guards against the silently-wrong-probability failure mode
/// of feeding a model a reordered or truncated vector.
pub(crate) fn check_features(
    name: &str,
    expected: usize,
    features: &[f32],
) -> Result<(), InferenceError> {
    if features.len() != expected {
        return Err(InferenceError::FeatureShape {
            model: name.to_string(),
            expected,
            actual: features.len(),
        });
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::NonFiniteInput {
            model: name.to_string(),
        });
    }
    Ok(())
}
