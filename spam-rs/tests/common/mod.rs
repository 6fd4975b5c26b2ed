//! Shared fixtures: a tiny trained ensemble written as JSON artifacts

#![allow(dead_code)]

use serde_json::{json, Value};
use spam_rs::config::Config;
use std::fs;
use std::path::Path;

/// Vocabulary columns: free, prize, meeting, tomorrow
pub fn write_vectorizer(dir: &Path) {
    write(
        dir,
        "vectorizer.json",
        json!({
            "vocabulary": {"free": 0, "prize": 1, "meeting": 2, "tomorrow": 3},
            "idf": [1.0, 1.0, 1.0, 1.0]
        }),
    );
}

/// Four models that agree: spammy vocabulary votes Spam (code 0)
pub fn write_models(dir: &Path) {
    write(
        dir,
        "SVM_model.json",
        json!({
            "estimator": {
                "kind": "kernel_svm",
                "kernel": "sigmoid",
                "gamma": 1.0,
                "support_vectors": [
                    [0.7071, 0.7071, 0.0, 0.0],
                    [0.0, 0.0, 0.7071, 0.7071]
                ],
                "dual_coef": [-1.0, 1.0],
                "intercept": 0.0,
                "classes": [0, 1]
            }
        }),
    );
    write(
        dir,
        "Logistic_Regression_model.json",
        json!({
            "estimator": {
                "kind": "linear",
                "coef": [2.0, 2.0, -2.0, -2.0],
                "intercept": 0.0,
                "classes": [1, 0],
                "probability": "logistic"
            }
        }),
    );
    write(
        dir,
        "Naive_Bayes_model.json",
        json!({
            "estimator": {
                "kind": "naive_bayes",
                "classes": [0, 1],
                "class_log_prior": [-0.6931, -0.6931],
                "feature_log_prob": [
                    [-0.9163, -0.9163, -2.3026, -2.3026],
                    [-2.3026, -2.3026, -0.9163, -0.9163]
                ]
            }
        }),
    );
    write(
        dir,
        "Random_Forest_model.json",
        json!({
            "estimator": {
                "kind": "forest",
                "classes": [0, 1],
                "n_features": 4,
                "trees": [{
                    "nodes": [
                        {"feature": 0, "threshold": 0.3, "left": 1, "right": 2},
                        {"value": [0.0, 4.0]},
                        {"value": [3.0, 1.0]}
                    ]
                }]
            }
        }),
    );
}

pub fn write(dir: &Path, name: &str, value: Value) {
    fs::write(dir.join(name), value.to_string()).unwrap();
}

pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.models.models_dir = dir.to_path_buf();
    config
}
