use crate::error::{Result, SpamError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub models: ModelsConfig,
    pub mailbox: MailboxConfig,
    pub logging: LoggingConfig,
}

/// Where trained artifacts live and which of them to load
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Base directory holding the transformer and every `<Name>_model.json`
    pub models_dir: PathBuf,
    /// File name of the shared feature transformer inside `models_dir`
    pub transformer_file: String,
    /// Model names to load, in ensemble iteration order
    pub available_models: Vec<String>,
    /// Model whose confidence is reported as the primary confidence
    pub preferred_model: String,
    /// Model used by the single-model batch scoring path
    pub batch_model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Header carrying provider labels (Gmail exports use `X-Gmail-Labels`)
    pub labels_header: String,
    /// Default destination for batch CSV output
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("outputs/models"),
            transformer_file: "vectorizer.json".to_string(),
            available_models: vec![
                "SVM".to_string(),
                "Naive_Bayes".to_string(),
                "Random_Forest".to_string(),
                "Logistic_Regression".to_string(),
            ],
            preferred_model: "SVM".to_string(),
            batch_model: "SVM".to_string(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            labels_header: "X-Gmail-Labels".to_string(),
            output_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ModelsConfig {
    pub fn transformer_path(&self) -> PathBuf {
        self.models_dir.join(&self.transformer_file)
    }

    /// Artifact path for a configured model name
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(format!("{}_model.json", name))
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SpamError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| SpamError::Config(e.to_string()))
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
