//! Ensemble predictor
//!
//! Runs every model of a snapshot on one message and tallies a strict
//! majority. A failing model is recorded as `Error` and still counts in the
//! denominator, which tips partial failures toward `Ham`.

use indexmap::IndexMap;
use tracing::{debug, error, warn};

use super::types::{EnsembleVerdict, ModelResult, Verdict};
use crate::model::{Classifier, LoadedModel, RegistrySnapshot};
use crate::text::normalize;

pub struct EnsemblePredictor {
    preferred_model: String,
}

impl EnsemblePredictor {
    /// `preferred_model` supplies the primary confidence when it is loaded
    pub fn new(preferred_model: impl Into<String>) -> Self {
        Self {
            preferred_model: preferred_model.into(),
        }
    }

    /// Classify raw text; never fails, failures are encoded in the verdict
    pub fn predict(&self, snapshot: &RegistrySnapshot, text: &str) -> EnsembleVerdict {
        if snapshot.is_degraded() {
            warn!("No models loaded, returning degraded verdict");
            return EnsembleVerdict::degraded();
        }

        let normalized = normalize(text);
        let features = match snapshot.features(&normalized) {
            Ok(features) => Some(features),
            Err(e) => {
                error!("Feature transform failed: {}", e);
                None
            }
        };

        let mut detailed_results = IndexMap::new();
        let mut spam_votes = 0;

        for model in snapshot.models() {
            let result = match &features {
                Some(features) => Self::run_model(model, features),
                None => ModelResult::error(),
            };
            if result.prediction == Verdict::Spam {
                spam_votes += 1;
            }
            detailed_results.insert(model.name().to_string(), result);
        }

        let total_votes = snapshot.len();
        let prediction = if spam_votes * 2 > total_votes {
            Verdict::Spam
        } else {
            Verdict::Ham
        };

        let primary = snapshot
            .model(&self.preferred_model)
            .or_else(|| snapshot.models().first())
            .map(LoadedModel::name);
        let confidence = primary
            .and_then(|name| detailed_results.get(name))
            .map_or(0.0, |r| r.confidence);

        debug!(
            "Consensus {} with {}/{} spam votes",
            prediction, spam_votes, total_votes
        );

        EnsembleVerdict {
            prediction,
            confidence,
            spam_votes,
            total_votes,
            detailed_results,
        }
    }

    fn run_model(model: &LoadedModel, features: &[f64]) -> ModelResult {
        let code = match model.classifier().predict(features) {
            Ok(code) => code,
            Err(e) => {
                error!("Prediction failed for {}: {}", model.name(), e);
                return ModelResult::error();
            }
        };

        let confidence = match model.classifier() {
            Classifier::Probabilistic(classifier) => match classifier.probability(features) {
                Ok(distribution) => confidence_of(&distribution),
                Err(e) => {
                    warn!("Probability failed for {}: {}", model.name(), e);
                    0.0
                }
            },
            Classifier::LabelOnly(_) => 0.0,
        };

        ModelResult {
            prediction: model.labels().decode(code).into(),
            confidence,
        }
    }
}

/// Highest class probability as a percentage
fn confidence_of(distribution: &[f64]) -> f64 {
    let max = distribution
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))));
    max.map_or(0.0, |p| (p * 100.0).clamp(0.0, 100.0))
}
