//! Logistic-regression scorer backed by a JSON coefficient artifact.
//!
//! The communication and fusion classifiers are linear models; their
//! artifacts are plain coefficient files written at training time:
//! `{"weights": [...], "intercept": ...}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, ModelLoadError};
use crate::models::{check_features, RiskScorer};

/// On-disk shape of a linear model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearArtifact {
    weights: Vec<f64>,
    intercept: f64,
}

/// Binary logistic regression: `sigmoid(intercept + weights . features)`.
pub struct LinearScorer {
    name: String,
    weights: Vec<f64>,
    intercept: f64,
}

impl LinearScorer {
    /// Build a scorer from explicit coefficients.
    pub fn new(name: &str, weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            name: name.to_string(),
            weights,
            intercept,
        }
    }

    /// Load a coefficient artifact and verify it matches the feature count
    /// the caller's pipeline will supply. A width mismatch here would
    /// otherwise surface only as wrong-but-valid-looking probabilities.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        name: &str,
        expected_features: usize,
    ) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelLoadError::Missing {
                path: path.display().to_string(),
            });
        }

        let raw = std::fs::read(path).map_err(|source| ModelLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let artifact: LinearArtifact =
            serde_json::from_slice(&raw).map_err(|e| ModelLoadError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if artifact.weights.len() != expected_features {
            return Err(ModelLoadError::Malformed {
                path: path.display().to_string(),
                reason: format!(
                    "expected {} coefficients, found {}",
                    expected_features,
                    artifact.weights.len()
                ),
            });
        }
        if !artifact.intercept.is_finite() || artifact.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelLoadError::Malformed {
                path: path.display().to_string(),
                reason: "non-finite coefficient".to_string(),
            });
        }

        tracing::info!(
            model = %name,
            path = %path.display(),
            features = artifact.weights.len(),
            "Linear model loaded"
        );

        Ok(Self::new(name, artifact.weights, artifact.intercept))
    }
}

impl RiskScorer for LinearScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> usize {
        self.weights.len()
    }

    fn score(&self, features: &[f32]) -> Result<f64, InferenceError> {
        check_features(&self.name, self.weights.len(), features)?;

        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * f64::from(*x))
                .sum::<f64>();
        let probability = sigmoid(z);

        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteOutput {
                model: self.name.clone(),
            });
        }
        Ok(probability)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
