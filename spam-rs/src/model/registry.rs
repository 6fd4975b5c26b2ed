//! Model registry
//!
//! Loads the shared transformer and every configured classifier into an
//! immutable [`RegistrySnapshot`]. A missing transformer is fatal; a missing
//! or corrupt classifier only drops that one entry.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use super::artifact::ModelArtifact;
use super::tfidf::TfidfVectorizer;
use super::types::{Classifier, FeatureTransformer, LabelEncoding, ModelError};
use crate::config::ModelsConfig;
use crate::error::{Result, SpamError};
use crate::text::NormalizedText;

/// A classifier with the name it was configured under
#[derive(Debug)]
pub struct LoadedModel {
    name: String,
    classifier: Classifier,
    labels: LabelEncoding,
}

impl LoadedModel {
    pub fn new(name: impl Into<String>, classifier: Classifier, labels: LabelEncoding) -> Self {
        Self {
            name: name.into(),
            classifier,
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn labels(&self) -> &LabelEncoding {
        &self.labels
    }
}

/// Read-only view of everything a prediction needs
///
/// Built once per load and never mutated, so it can be shared across
/// threads behind an `Arc`.
pub struct RegistrySnapshot {
    transformer: Arc<dyn FeatureTransformer>,
    models: Vec<LoadedModel>,
}

impl RegistrySnapshot {
    pub fn new(transformer: Arc<dyn FeatureTransformer>, models: Vec<LoadedModel>) -> Self {
        Self {
            transformer,
            models,
        }
    }

    pub fn transformer(&self) -> &dyn FeatureTransformer {
        self.transformer.as_ref()
    }

    /// Loaded models in configured order
    pub fn models(&self) -> &[LoadedModel] {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&LoadedModel> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Alive but unable to vote
    pub fn is_degraded(&self) -> bool {
        self.models.is_empty()
    }

    /// Feature row for a single document
    pub fn features(&self, text: &NormalizedText) -> std::result::Result<Vec<f64>, ModelError> {
        let mut rows = self.transformer.transform(std::slice::from_ref(text))?;
        rows.pop().ok_or(ModelError::EmptyOutput)
    }
}

impl std::fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySnapshot")
            .field("width", &self.transformer.width())
            .field("models", &self.model_names())
            .finish()
    }
}

/// Loads artifacts named by [`ModelsConfig`]
pub struct ModelRegistry {
    config: ModelsConfig,
}

impl ModelRegistry {
    pub fn new(config: ModelsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelsConfig {
        &self.config
    }

    /// Build a fresh snapshot from storage
    ///
    /// Each call starts from nothing; entries from an earlier snapshot are
    /// never carried over.
    pub fn load(&self) -> Result<RegistrySnapshot> {
        info!("Loading models from {}", self.config.models_dir.display());

        let transformer = Self::load_transformer(&self.config.transformer_path())?;

        let mut models: Vec<LoadedModel> = Vec::new();
        for name in &self.config.available_models {
            if models.iter().any(|m| &m.name == name) {
                warn!("Model {} configured twice, keeping the first", name);
                continue;
            }

            let path = self.config.model_path(name);
            match Self::load_model(name, &path) {
                Ok(Some(model)) => {
                    info!("Loaded {}", name);
                    models.push(model);
                }
                Ok(None) => warn!("Model file not found: {}", path.display()),
                Err(e) => error!("Failed to load {}: {}", name, e),
            }
        }

        if models.is_empty() {
            error!("No models loaded!");
        } else {
            info!("{} of {} models loaded", models.len(), self.config.available_models.len());
        }

        Ok(RegistrySnapshot::new(Arc::new(transformer), models))
    }

    fn load_transformer(path: &Path) -> Result<TfidfVectorizer> {
        if !path.exists() {
            return Err(SpamError::ArtifactNotFound(path.display().to_string()));
        }

        let transformer: TfidfVectorizer = read_json(path)?;
        transformer
            .validate()
            .map_err(|reason| corrupt(path, reason))?;

        info!(
            "Loaded feature transformer ({} terms, width {})",
            transformer.vocabulary_len(),
            transformer.width()
        );
        Ok(transformer)
    }

    fn load_model(name: &str, path: &Path) -> Result<Option<LoadedModel>> {
        if !path.exists() {
            return Ok(None);
        }

        let artifact: ModelArtifact = read_json(path)?;
        artifact.validate().map_err(|reason| corrupt(path, reason))?;

        let (classifier, labels) = artifact.into_parts();
        Ok(Some(LoadedModel::new(name, classifier, labels)))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| corrupt(path, e.to_string()))
}

fn corrupt(path: &Path, reason: impl Into<String>) -> SpamError {
    SpamError::CorruptArtifact {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}
