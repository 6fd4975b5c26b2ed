//! Ensemble verdict types

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::model::Label;

/// Outcome of one model, or of the whole ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Spam,
    Ham,
    /// The model failed, or no model was available to vote
    Error,
}

impl From<Label> for Verdict {
    fn from(label: Label) -> Self {
        match label {
            Label::Spam => Verdict::Spam,
            Label::Ham => Verdict::Ham,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Spam => write!(f, "Spam"),
            Verdict::Ham => write!(f, "Ham"),
            Verdict::Error => write!(f, "Error"),
        }
    }
}

/// What one model said about one message
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelResult {
    pub prediction: Verdict,
    /// Percentage in `[0, 100]`; 0 when the model has no probability output
    pub confidence: f64,
}

impl ModelResult {
    pub fn error() -> Self {
        Self {
            prediction: Verdict::Error,
            confidence: 0.0,
        }
    }
}

/// Consensus across the ensemble
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleVerdict {
    pub prediction: Verdict,
    /// Confidence of the preferred model, for display
    pub confidence: f64,
    pub spam_votes: usize,
    /// Every loaded model, including ones that errored
    pub total_votes: usize,
    pub detailed_results: IndexMap<String, ModelResult>,
}

impl EnsembleVerdict {
    /// Returned when no model is loaded
    pub fn degraded() -> Self {
        Self {
            prediction: Verdict::Error,
            confidence: 0.0,
            spam_votes: 0,
            total_votes: 0,
            detailed_results: IndexMap::new(),
        }
    }

    pub fn is_spam(&self) -> bool {
        self.prediction == Verdict::Spam
    }

    pub fn is_degraded(&self) -> bool {
        self.total_votes == 0
    }

    /// Vote fraction such as `2/3 Models`
    pub fn spam_score(&self) -> String {
        format!("{}/{} Models", self.spam_votes, self.total_votes)
    }

    /// Shape handed to callers outside the crate
    pub fn to_report(&self) -> PredictionReport {
        PredictionReport {
            prediction: self.prediction,
            confidence: self.confidence,
            is_spam: self.is_spam(),
            spam_score: self.spam_score(),
            detailed_results: self.detailed_results.clone(),
        }
    }
}

/// Serializable single-message prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub prediction: Verdict,
    pub confidence: f64,
    pub is_spam: bool,
    pub spam_score: String,
    pub detailed_results: IndexMap<String, ModelResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_verdict() {
        let verdict = EnsembleVerdict::degraded();
        assert_eq!(verdict.prediction, Verdict::Error);
        assert_eq!(verdict.spam_score(), "0/0 Models");
        assert!(verdict.is_degraded());
        assert!(!verdict.is_spam());
    }

    #[test]
    fn test_report_json_shape() {
        let mut detailed = IndexMap::new();
        detailed.insert(
            "SVM".to_string(),
            ModelResult {
                prediction: Verdict::Spam,
                confidence: 97.5,
            },
        );
        let verdict = EnsembleVerdict {
            prediction: Verdict::Spam,
            confidence: 97.5,
            spam_votes: 1,
            total_votes: 1,
            detailed_results: detailed,
        };

        let json = serde_json::to_value(verdict.to_report()).unwrap();
        assert_eq!(json["prediction"], "Spam");
        assert_eq!(json["is_spam"], true);
        assert_eq!(json["spam_score"], "1/1 Models");
        assert_eq!(json["detailed_results"]["SVM"]["confidence"], 97.5);
    }
}
