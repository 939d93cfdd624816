//! Core data types for the fusion pipeline.

pub mod communication;
pub mod decision;
pub mod request;
pub mod transaction;

pub use communication::CommunicationFeatures;
pub use decision::{Decision, DecisionLabel};
pub use request::PredictRequest;
pub use transaction::TransactionFeatures;

/// Round to a fixed number of decimal places.
///
/// Display/storage precision only; risk comparisons always run on the
/// unrounded values.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
