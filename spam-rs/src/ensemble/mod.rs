//! Consensus voting across all loaded classifiers

pub mod predictor;
pub mod types;

pub use predictor::EnsemblePredictor;
pub use types::*;
