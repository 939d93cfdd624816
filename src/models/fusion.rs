//! Fusion engine: the two base scorers and the stacking combiner.
//!
//! Stacking design: the transaction and communication models each produce a
//! probability, and a third classifier trained on those two probabilities
//! (in that fixed order) produces the final fraud probability.

use std::path::Path;

use crate::config::ModelsConfig;
use crate::error::{InferenceError, ModelLoadError};
use crate::models::{LinearScorer, OnnxScorer, RiskScorer};
use crate::types::{CommunicationFeatures, Decision, TransactionFeatures};

/// The fusion combiner consumes exactly (transaction_risk, communication_risk).
const FUSION_FEATURE_COUNT: usize = 2;

/// Holds the three pre-trained models for the lifetime of the process.
pub struct FusionEngine {
    tx_scorer: Box<dyn RiskScorer>,
    comm_scorer: Box<dyn RiskScorer>,
    fusion_scorer: Box<dyn RiskScorer>,
}

impl FusionEngine {
    /// Load all three artifacts from the configured directory. Any failure
    /// aborts startup: the pipeline never serves with a partial model set.
    pub fn load(config: &ModelsConfig) -> Result<Self, ModelLoadError> {
        let dir = Path::new(&config.models_dir);

        let tx_scorer = OnnxScorer::load(
            dir.join(&config.tx_model),
            "transaction",
            TransactionFeatures::FEATURE_COUNT,
            config.onnx_threads,
        )?;
        let comm_scorer = LinearScorer::from_file(
            dir.join(&config.comm_model),
            "communication",
            CommunicationFeatures::FEATURE_COUNT,
        )?;
        let fusion_scorer = LinearScorer::from_file(
            dir.join(&config.fusion_model),
            "fusion",
            FUSION_FEATURE_COUNT,
        )?;

        tracing::info!(
            models_dir = %dir.display(),
            "Fusion engine initialized with transaction, communication and fusion models"
        );

        Ok(Self {
            tx_scorer: Box::new(tx_scorer),
            comm_scorer: Box::new(comm_scorer),
            fusion_scorer: Box::new(fusion_scorer),
        })
    }

    /// Assemble an engine from already-built scorers.
    pub fn from_parts(
        tx_scorer: Box<dyn RiskScorer>,
        comm_scorer: Box<dyn RiskScorer>,
        fusion_scorer: Box<dyn RiskScorer>,
    ) -> Self {
        Self {
            tx_scorer,
            comm_scorer,
            fusion_scorer,
        }
    }

    /// Probability of fraud given only the transaction signal.
    pub fn score_transaction(&self, tx: &TransactionFeatures) -> Result<f64, InferenceError> {
        self.tx_scorer.score(&tx.to_feature_vec())
    }

    /// Probability of fraud given only the communication signal.
    pub fn score_communication(&self, comm: &CommunicationFeatures) -> Result<f64, InferenceError> {
        self.comm_scorer.score(&comm.to_feature_vec())
    }

    /// Combine the two upstream probabilities. The (transaction,
    /// communication) order is the order the combiner was trained on;
    /// swapping them corrupts the output silently.
    pub fn fuse(&self, transaction_risk: f64, communication_risk: f64) -> Result<f64, InferenceError> {
        self.fusion_scorer
            .score(&[transaction_risk as f32, communication_risk as f32])
    }

    /// Run the full pipeline: both base scorers, the combiner, and decision
    /// assembly. Synchronous and sequential; pure given the loaded models.
    pub fn predict(
        &self,
        tx: &TransactionFeatures,
        comm: &CommunicationFeatures,
    ) -> Result<Decision, InferenceError> {
        let transaction_risk = self.score_transaction(tx)?;
        let communication_risk = self.score_communication(comm)?;
        let fraud_probability = self.fuse(transaction_risk, communication_risk)?;

        tracing::debug!(
            transaction_risk,
            communication_risk,
            fraud_probability,
            "Pipeline scored event pair"
        );

        Ok(Decision::build(
            tx,
            comm,
            transaction_risk,
            communication_risk,
            fraud_probability,
        ))
    }
}
