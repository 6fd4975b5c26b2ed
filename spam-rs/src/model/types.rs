//! Capability traits and label encoding

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::text::NormalizedText;

/// Failure of a single model or transformer call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("feature width mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty output")]
    EmptyOutput,

    #[error("invalid model state: {0}")]
    Invalid(String),
}

/// Class a label code decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Spam,
    Ham,
}

/// Explicit mapping from raw label codes to classes
///
/// Shipped alongside each artifact. Artifacts that carry none get the
/// training convention `0 -> Spam`, anything else `-> Ham`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoding {
    #[serde(default)]
    pub codes: BTreeMap<i64, Label>,
    #[serde(default = "default_fallback")]
    pub fallback: Label,
}

fn default_fallback() -> Label {
    Label::Ham
}

impl Default for LabelEncoding {
    fn default() -> Self {
        Self {
            codes: BTreeMap::from([(0, Label::Spam)]),
            fallback: Label::Ham,
        }
    }
}

impl LabelEncoding {
    pub fn decode(&self, code: i64) -> Label {
        self.codes.get(&code).copied().unwrap_or(self.fallback)
    }
}

/// Model that only yields a label code
#[cfg_attr(test, mockall::automock)]
pub trait LabelClassifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError>;
}

/// Model that also yields a distribution over its classes
#[cfg_attr(test, mockall::automock)]
pub trait ProbabilisticClassifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError>;

    fn probability(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Text to fixed-width vectors, in the space the classifiers were trained on
pub trait FeatureTransformer: Send + Sync {
    fn transform(&self, docs: &[NormalizedText]) -> Result<Vec<Vec<f64>>, ModelError>;

    /// Number of columns every output row has
    fn width(&self) -> usize;
}

/// A loaded classifier tagged with what it can do
pub enum Classifier {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    LabelOnly(Box<dyn LabelClassifier>),
}

impl Classifier {
    pub fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        match self {
            Classifier::Probabilistic(model) => model.predict(features),
            Classifier::LabelOnly(model) => model.predict(features),
        }
    }

    pub fn has_probability(&self) -> bool {
        matches!(self, Classifier::Probabilistic(_))
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classifier::Probabilistic(_) => write!(f, "Classifier::Probabilistic"),
            Classifier::LabelOnly(_) => write!(f, "Classifier::LabelOnly"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoding() {
        let labels = LabelEncoding::default();
        assert_eq!(labels.decode(0), Label::Spam);
        assert_eq!(labels.decode(1), Label::Ham);
        assert_eq!(labels.decode(-3), Label::Ham);
    }

    #[test]
    fn test_explicit_encoding() {
        let labels: LabelEncoding =
            serde_json::from_str(r#"{"codes": {"1": "spam", "0": "ham"}}"#).unwrap();
        assert_eq!(labels.decode(1), Label::Spam);
        assert_eq!(labels.decode(0), Label::Ham);
        assert_eq!(labels.decode(7), Label::Ham);
    }

    #[test]
    fn test_classifier_dispatch() {
        let mut mock = MockLabelClassifier::new();
        mock.expect_predict().returning(|_| Ok(0));
        let classifier = Classifier::LabelOnly(Box::new(mock));

        assert_eq!(classifier.predict(&[1.0]), Ok(0));
        assert!(!classifier.has_probability());
    }
}
