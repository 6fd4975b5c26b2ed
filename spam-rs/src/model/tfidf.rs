//! TF-IDF feature transformer

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::types::{FeatureTransformer, ModelError};
use crate::text::NormalizedText;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Vocabulary-based TF-IDF vectorizer
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

fn default_lowercase() -> bool {
    true
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl TfidfVectorizer {
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Self {
        Self {
            vocabulary,
            idf,
            lowercase: true,
            sublinear_tf: false,
            norm: Some(Norm::L2),
        }
    }

    pub fn with_norm(mut self, norm: Option<Norm>) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    /// Every vocabulary column must have an idf weight
    pub fn validate(&self) -> Result<(), String> {
        match self.vocabulary.iter().find(|(_, &col)| col >= self.idf.len()) {
            Some((term, col)) => Err(format!(
                "term {:?} maps to column {} but only {} idf weights exist",
                term,
                col,
                self.idf.len()
            )),
            None => Ok(()),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    fn vectorize(&self, doc: &str) -> Vec<f64> {
        let mut row: Vec<f64> = vec![0.0; self.idf.len()];

        let lowered;
        let doc = if self.lowercase {
            lowered = doc.to_lowercase();
            lowered.as_str()
        } else {
            doc
        };

        for token in TOKEN.find_iter(doc) {
            if let Some(&col) = self.vocabulary.get(token.as_str()) {
                row[col] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            if *value > 0.0 {
                let tf = if self.sublinear_tf {
                    1.0 + value.ln()
                } else {
                    *value
                };
                *value = tf * idf;
            }
        }

        let norm = match self.norm {
            Some(Norm::L2) => row.iter().map(|v| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => row.iter().map(|v| v.abs()).sum::<f64>(),
            None => 0.0,
        };
        if norm > 0.0 {
            row.iter_mut().for_each(|v| *v /= norm);
        }

        row
    }
}

impl FeatureTransformer for TfidfVectorizer {
    fn transform(&self, docs: &[NormalizedText]) -> Result<Vec<Vec<f64>>, ModelError> {
        Ok(docs.iter().map(|doc| self.vectorize(doc)).collect())
    }

    fn width(&self) -> usize {
        self.idf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;

    fn vectorizer() -> TfidfVectorizer {
        let vocabulary = HashMap::from([
            ("free".to_string(), 0),
            ("money".to_string(), 1),
            ("meeting".to_string(), 2),
            ("num".to_string(), 3),
        ]);
        TfidfVectorizer::new(vocabulary, vec![1.0, 2.0, 1.5, 1.0])
    }

    #[test]
    fn test_counts_and_l2_norm() {
        let rows = vectorizer()
            .transform(&[normalize("FREE free money, a meeting?")])
            .unwrap();
        let row = &rows[0];
        assert_eq!(row.len(), 4);

        // raw tf-idf: [2.0, 2.0, 1.5, 0.0]
        let norm = (2.0f64 * 2.0 + 2.0 * 2.0 + 1.5 * 1.5).sqrt();
        assert!((row[0] - 2.0 / norm).abs() < 1e-12);
        assert!((row[1] - 2.0 / norm).abs() < 1e-12);
        assert!((row[2] - 1.5 / norm).abs() < 1e-12);
        assert_eq!(row[3], 0.0);
    }

    #[test]
    fn test_number_placeholder_is_a_feature() {
        let rows = vectorizer().transform(&[normalize("call 0800123")]).unwrap();
        assert_eq!(rows[0][3], 1.0);
    }

    #[test]
    fn test_single_char_tokens_ignored() {
        let rows = vectorizer().transform(&[normalize("a b c")]).unwrap();
        assert!(rows[0].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_sublinear_without_norm() {
        let rows = vectorizer()
            .with_norm(None)
            .with_sublinear_tf(true)
            .transform(&[normalize("money money money")])
            .unwrap();
        assert!((rows[0][1] - (1.0 + 3.0f64.ln()) * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_out_of_range_column() {
        let broken = TfidfVectorizer::new(HashMap::from([("x".to_string(), 5)]), vec![1.0]);
        assert!(broken.validate().is_err());
        assert!(vectorizer().validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let v: TfidfVectorizer =
            serde_json::from_str(r#"{"vocabulary": {"hi": 0}, "idf": [1.0]}"#).unwrap();
        assert_eq!(v.width(), 1);
        assert_eq!(v.norm, Some(Norm::L2));
        assert!(v.lowercase);
    }
}
