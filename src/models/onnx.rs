//! ONNX-backed scorer for the transaction tree-ensemble model.

use std::path::Path;
use std::sync::RwLock;

use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};

use crate::error::{InferenceError, ModelLoadError};
use crate::models::{check_features, RiskScorer};

/// Scorer wrapping one ONNX Runtime session. The session is loaded once at
/// startup and held behind a lock because `run` needs exclusive access.
pub struct OnnxScorer {
    name: String,
    feature_count: usize,
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxScorer {
    /// Load the model file and resolve its input/output tensor names from
    /// the session metadata. Any failure is fatal to startup.
    pub fn load<P: AsRef<Path>>(
        path: P,
        name: &str,
        feature_count: usize,
        onnx_threads: usize,
    ) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelLoadError::Missing {
                path: path.display().to_string(),
            });
        }

        ort::init().commit().map_err(|source| ModelLoadError::Onnx {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(
            model = %name,
            path = %path.display(),
            threads = onnx_threads,
            "Loading ONNX model"
        );

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|source| ModelLoadError::Onnx {
                path: path.display().to_string(),
                source,
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        tracing::info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            name: name.to_string(),
            feature_count,
            session: RwLock::new(session),
            input_name,
            output_name,
        })
    }
}

impl RiskScorer for OnnxScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn score(&self, features: &[f32]) -> Result<f64, InferenceError> {
        check_features(&self.name, self.feature_count, features)?;

        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.to_vec()))?;

        let mut session = self.session.write().map_err(|_| InferenceError::Poisoned {
            model: self.name.clone(),
        })?;
        let outputs = session.run(ort::inputs![&self.input_name => input])?;

        let probability = extract_positive_probability(&outputs, &self.output_name, &self.name)?;
        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteOutput {
                model: self.name.clone(),
            });
        }
        Ok(probability)
    }
}

/// Pull the positive-class probability out of a binary classifier's output.
/// Tree ensembles exported through different converters disagree on shape:
/// plain probability tensors, or the ZipMap seq(map(int64, float)) form.
fn extract_positive_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64, InferenceError> {
    if let Some(output) = outputs.get(output_name) {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Ok(positive_class_from_tensor(&dims, data));
        }
        if DynSequenceValueType::can_downcast(&output.dtype()) {
            if let Some(prob) = positive_class_from_sequence_map(output)? {
                return Ok(prob);
            }
        }
    }

    // Fallback: scan every non-label output.
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Ok(positive_class_from_tensor(&dims, data));
        }
        if DynSequenceValueType::can_downcast(&output.dtype()) {
            if let Some(prob) = positive_class_from_sequence_map(&output)? {
                return Ok(prob);
            }
        }
    }

    Err(InferenceError::MissingOutput {
        model: model_name.to_string(),
    })
}

fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> f64 {
    let classes = match dims {
        [_, n] => *n as usize,
        [n] => *n as usize,
        _ => data.len(),
    };

    if classes >= 2 {
        f64::from(data[1])
    } else {
        data.first().map(|&v| f64::from(v)).unwrap_or(0.5)
    }
}

/// `Ok(None)` when the sequence carries no class probabilities; the caller
/// reports a missing output for the whole model.
fn positive_class_from_sequence_map(
    output: &ort::value::DynValue,
) -> Result<Option<f64>, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(InferenceError::Session)?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    let first = match maps.first() {
        Some(first) => first,
        None => return Ok(None),
    };
    let pairs = first.try_extract_key_values::<i64, f32>()?;

    for (class_id, prob) in &pairs {
        if *class_id == 1 {
            return Ok(Some(f64::from(*prob)));
        }
    }
    // Degenerate single-class map: invert class 0.
    for (class_id, prob) in &pairs {
        if *class_id == 0 {
            return Ok(Some(1.0 - f64::from(*prob)));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    // Session-backed tests require a model artifact on disk; the tensor
    // shape handling is covered here and the load path is exercised by the
    // serving binary at startup.
    use super::positive_class_from_tensor;

    #[test]
    fn two_class_tensor_takes_index_one() {
        assert_eq!(positive_class_from_tensor(&[1, 2], &[0.3, 0.7]), f64::from(0.7_f32));
    }

    #[test]
    fn single_probability_tensor_is_used_directly() {
        assert_eq!(positive_class_from_tensor(&[1, 1], &[0.9]), f64::from(0.9_f32));
    }

    #[test]
    fn flat_two_class_tensor_takes_index_one() {
        assert_eq!(positive_class_from_tensor(&[2], &[0.2, 0.8]), f64::from(0.8_f32));
    }
}
