//! On-disk classifier formats
//!
//! Every `<Name>_model.json` holds one [`ModelArtifact`]: the estimator's
//! learned parameters plus an optional label encoding.

use serde::Deserialize;

use super::types::{
    Classifier, LabelClassifier, LabelEncoding, ModelError, ProbabilisticClassifier,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub labels: LabelEncoding,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearModel),
    KernelSvm(KernelSvmModel),
    NaiveBayes(NaiveBayesModel),
    Forest(ForestModel),
}

impl ModelArtifact {
    /// Check internal consistency before the model is trusted with inference
    pub fn validate(&self) -> Result<(), String> {
        match &self.estimator {
            Estimator::Linear(model) => model.validate(),
            Estimator::KernelSvm(model) => model.validate(),
            Estimator::NaiveBayes(model) => model.validate(),
            Estimator::Forest(model) => model.validate(),
        }
    }

    pub fn into_parts(self) -> (Classifier, LabelEncoding) {
        let classifier = match self.estimator {
            Estimator::Linear(model) if model.probability.is_some() => {
                Classifier::Probabilistic(Box::new(model))
            }
            Estimator::Linear(model) => Classifier::LabelOnly(Box::new(model)),
            Estimator::KernelSvm(model) if model.has_platt() => {
                Classifier::Probabilistic(Box::new(model))
            }
            Estimator::KernelSvm(model) => Classifier::LabelOnly(Box::new(model)),
            Estimator::NaiveBayes(model) => Classifier::Probabilistic(Box::new(model)),
            Estimator::Forest(model) => Classifier::Probabilistic(Box::new(model)),
        };
        (classifier, self.labels)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityLink {
    Logistic,
}

/// Binary linear decision function (linear SVM, logistic regression)
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
    /// `[negative, positive]` class codes
    pub classes: [i64; 2],
    #[serde(default)]
    pub probability: Option<ProbabilityLink>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), String> {
        if self.coef.is_empty() {
            return Err("linear model has no coefficients".to_string());
        }
        Ok(())
    }

    fn decision(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_width(self.coef.len(), features)?;
        Ok(dot(&self.coef, features) + self.intercept)
    }
}

impl LabelClassifier for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let decision = self.decision(features)?;
        Ok(if decision > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        })
    }
}

impl ProbabilisticClassifier for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        LabelClassifier::predict(self, features)
    }

    fn probability(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        match self.probability {
            Some(ProbabilityLink::Logistic) => {
                let positive = sigmoid(self.decision(features)?);
                Ok(vec![1.0 - positive, positive])
            }
            None => Err(ModelError::Invalid(
                "model was not fitted with probability estimates".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf,
    Sigmoid,
    Poly,
}

/// Binary kernel support vector classifier
///
/// `decision(x) = sum(dual_coef[i] * K(sv[i], x)) + intercept`; a positive
/// decision selects `classes[1]`. When Platt parameters are present they
/// apply to the negated decision, as libsvm computes them, and yield the
/// probability of `classes[0]`.
#[derive(Debug, Clone, Deserialize)]
pub struct KernelSvmModel {
    pub support_vectors: Vec<Vec<f64>>,
    /// One coefficient per support vector
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    pub classes: [i64; 2],
    pub kernel: Kernel,
    pub gamma: f64,
    #[serde(default)]
    pub coef0: f64,
    #[serde(default = "default_degree")]
    pub degree: i32,
    #[serde(default)]
    pub prob_a: Option<f64>,
    #[serde(default)]
    pub prob_b: Option<f64>,
}

fn default_degree() -> i32 {
    3
}

impl KernelSvmModel {
    fn validate(&self) -> Result<(), String> {
        let Some(first) = self.support_vectors.first() else {
            return Err("kernel svm has no support vectors".to_string());
        };
        if self.dual_coef.len() != self.support_vectors.len() {
            return Err(format!(
                "kernel svm has {} support vectors but {} dual coefficients",
                self.support_vectors.len(),
                self.dual_coef.len()
            ));
        }
        if self.support_vectors.iter().any(|sv| sv.len() != first.len()) {
            return Err("kernel svm support vectors differ in width".to_string());
        }
        if self.prob_a.is_some() != self.prob_b.is_some() {
            return Err("kernel svm needs both prob_a and prob_b".to_string());
        }
        Ok(())
    }

    fn has_platt(&self) -> bool {
        self.prob_a.is_some() && self.prob_b.is_some()
    }

    fn kernel(&self, sv: &[f64], x: &[f64]) -> f64 {
        match self.kernel {
            Kernel::Linear => dot(sv, x),
            Kernel::Rbf => {
                let distance: f64 = sv.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
                (-self.gamma * distance).exp()
            }
            Kernel::Sigmoid => (self.gamma * dot(sv, x) + self.coef0).tanh(),
            Kernel::Poly => (self.gamma * dot(sv, x) + self.coef0).powi(self.degree),
        }
    }

    fn decision(&self, features: &[f64]) -> Result<f64, ModelError> {
        let width = self.support_vectors.first().map_or(0, Vec::len);
        check_width(width, features)?;

        Ok(self
            .support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel(sv, features))
            .sum::<f64>()
            + self.intercept)
    }
}

impl LabelClassifier for KernelSvmModel {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let decision = self.decision(features)?;
        Ok(if decision > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        })
    }
}

impl ProbabilisticClassifier for KernelSvmModel {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        LabelClassifier::predict(self, features)
    }

    fn probability(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let (Some(a), Some(b)) = (self.prob_a, self.prob_b) else {
            return Err(ModelError::Invalid(
                "model was not fitted with probability estimates".to_string(),
            ));
        };
        let f_apb = -self.decision(features)? * a + b;
        // stable form of 1 / (1 + exp(f_apb))
        let first = if f_apb >= 0.0 {
            (-f_apb).exp() / (1.0 + (-f_apb).exp())
        } else {
            1.0 / (1.0 + f_apb.exp())
        };
        Ok(vec![first, 1.0 - first])
    }
}

/// Multinomial naive Bayes
#[derive(Debug, Clone, Deserialize)]
pub struct NaiveBayesModel {
    pub classes: Vec<i64>,
    pub class_log_prior: Vec<f64>,
    /// One row of per-feature log probabilities per class
    pub feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayesModel {
    fn validate(&self) -> Result<(), String> {
        let n = self.classes.len();
        if n == 0 {
            return Err("naive bayes model has no classes".to_string());
        }
        if self.class_log_prior.len() != n || self.feature_log_prob.len() != n {
            return Err(format!(
                "naive bayes shape mismatch: {} classes, {} priors, {} feature rows",
                n,
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            ));
        }
        let width = self.feature_log_prob[0].len();
        if self.feature_log_prob.iter().any(|row| row.len() != width) {
            return Err("naive bayes feature rows differ in width".to_string());
        }
        Ok(())
    }

    fn joint_log_likelihood(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let width = self.feature_log_prob.first().map_or(0, Vec::len);
        check_width(width, features)?;

        Ok(self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, row)| prior + dot(row, features))
            .collect())
    }
}

impl ProbabilisticClassifier for NaiveBayesModel {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let jll = self.joint_log_likelihood(features)?;
        let best = argmax(&jll).ok_or(ModelError::EmptyOutput)?;
        Ok(self.classes[best])
    }

    fn probability(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let jll = self.joint_log_likelihood(features)?;
        let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = jll.iter().map(|v| (v - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(ModelError::Invalid("degenerate likelihoods".to_string()));
        }
        Ok(exp.into_iter().map(|v| v / total).collect())
    }
}

/// Ensemble of decision trees with averaged leaf distributions
#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Split node when `feature` is set, leaf otherwise
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    /// Per-class weights at a leaf
    #[serde(default)]
    pub value: Vec<f64>,
}

impl ForestModel {
    fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() || self.trees.is_empty() {
            return Err("forest has no classes or no trees".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {} is empty", t));
            }
            for node in &tree.nodes {
                match node.feature {
                    Some(feature) => {
                        if feature >= self.n_features
                            || node.left >= tree.nodes.len()
                            || node.right >= tree.nodes.len()
                        {
                            return Err(format!("tree {} has an out-of-range split", t));
                        }
                    }
                    None if node.value.len() != self.classes.len() => {
                        return Err(format!("tree {} has a leaf of the wrong width", t));
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }

    fn leaf<'a>(&self, tree: &'a Tree, features: &[f64]) -> Result<&'a TreeNode, ModelError> {
        let mut index = 0;
        // a well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..tree.nodes.len() {
            let node = &tree.nodes[index];
            match node.feature {
                None => return Ok(node),
                Some(feature) => {
                    index = if features[feature] <= node.threshold {
                        node.left
                    } else {
                        node.right
                    };
                }
            }
        }
        Err(ModelError::Invalid("tree traversal did not terminate".to_string()))
    }
}

impl ProbabilisticClassifier for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let proba = self.probability(features)?;
        let best = argmax(&proba).ok_or(ModelError::EmptyOutput)?;
        Ok(self.classes[best])
    }

    fn probability(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.n_features, features)?;

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = self.leaf(tree, features)?;
            let total: f64 = leaf.value.iter().sum();
            if total > 0.0 {
                for (acc, v) in proba.iter_mut().zip(&leaf.value) {
                    *acc += v / total;
                }
            }
        }
        let n = self.trees.len() as f64;
        Ok(proba.into_iter().map(|p| p / n).collect())
    }
}

fn check_width(expected: usize, features: &[f64]) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: features.len(),
        });
    }
    Ok(())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
