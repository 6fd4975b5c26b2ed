//! Prediction pipeline
//!
//! Owns the current [`RegistrySnapshot`] and hands it to the ensemble and
//! batch paths. Loading is lazy: the first prediction loads artifacts, and
//! an empty snapshot is retried on every call until a model shows up.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::config::Config;
use crate::ensemble::{EnsemblePredictor, EnsembleVerdict};
use crate::error::Result;
use crate::mailbox::{export, MailRecord, MailboxPipeline, MessageExtractor, ScoredRecord};
use crate::model::{ModelRegistry, RegistrySnapshot};

pub struct PredictionPipeline {
    config: Config,
    registry: ModelRegistry,
    predictor: EnsemblePredictor,
    mailbox: MailboxPipeline,
    snapshot: RwLock<Option<Arc<RegistrySnapshot>>>,
}

impl PredictionPipeline {
    /// Create a pipeline that loads models on first use
    pub fn new(config: Config) -> Self {
        Self {
            registry: ModelRegistry::new(config.models.clone()),
            predictor: EnsemblePredictor::new(config.models.preferred_model.clone()),
            mailbox: MailboxPipeline::new(MessageExtractor::new(
                config.mailbox.labels_header.clone(),
            )),
            snapshot: RwLock::new(None),
            config,
        }
    }

    /// Create a pipeline and load models eagerly
    pub fn with_models(config: Config) -> Result<Self> {
        let pipeline = Self::new(config);
        pipeline.reload()?;
        Ok(pipeline)
    }

    /// Create a pipeline around an already built snapshot
    pub fn from_snapshot(config: Config, snapshot: RegistrySnapshot) -> Self {
        let pipeline = Self::new(config);
        *pipeline
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
        pipeline
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the current snapshot with a fresh load from storage
    ///
    /// Readers holding the previous snapshot keep using it; nothing is
    /// merged across loads.
    pub fn reload(&self) -> Result<Arc<RegistrySnapshot>> {
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = Arc::new(self.registry.load()?);
        *slot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Current snapshot, loading when none is usable yet
    pub fn snapshot(&self) -> Result<Arc<RegistrySnapshot>> {
        {
            let slot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(snapshot) = slot.as_ref().filter(|s| !s.is_degraded()) {
                return Ok(snapshot.clone());
            }
        }

        debug!("No usable models, loading");
        self.reload()
    }

    /// Ensemble verdict for one piece of raw text
    ///
    /// Only a failed load of the shared transformer is an error; model
    /// failures are reported inside the verdict.
    pub fn predict_single(&self, text: &str) -> Result<EnsembleVerdict> {
        let snapshot = self.snapshot()?;
        Ok(self.predictor.predict(&snapshot, text))
    }

    /// Extract every message of an mbox archive
    pub fn process_mailbox<P: AsRef<Path>>(&self, path: P) -> Result<Vec<MailRecord>> {
        let records = self.mailbox.ingest(path)?;
        info!("Processed {} messages", records.len());
        Ok(records)
    }

    /// Label records with the configured batch model
    pub fn run_prediction(&self, records: Vec<MailRecord>) -> Result<Vec<ScoredRecord>> {
        let snapshot = self.snapshot()?;
        self.mailbox
            .score(records, &snapshot, &self.config.models.batch_model)
    }

    /// Ingest, score and optionally write an archive as CSV
    pub fn predict_mailbox_file<P: AsRef<Path>>(
        &self,
        path: P,
        output: Option<&Path>,
    ) -> Result<Vec<ScoredRecord>> {
        let records = self.process_mailbox(path)?;
        let scored = self.run_prediction(records)?;

        if let Some(output) = output {
            export::write_scored(output, &scored)?;
        }
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::Verdict;
    use crate::error::SpamError;
    use crate::model::{
        Classifier, FeatureTransformer, LabelEncoding, LoadedModel, MockLabelClassifier, ModelError,
    };
    use crate::text::NormalizedText;

    struct UnitTransformer;

    impl FeatureTransformer for UnitTransformer {
        fn transform(&self, texts: &[NormalizedText]) -> std::result::Result<Vec<Vec<f64>>, ModelError> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        fn width(&self) -> usize {
            1
        }
    }

    fn spam_model(name: &str) -> LoadedModel {
        let mut clf = MockLabelClassifier::new();
        clf.expect_predict().returning(|_| Ok(0));
        LoadedModel::new(name, Classifier::LabelOnly(Box::new(clf)), LabelEncoding::default())
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.models.models_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_predict_single_with_snapshot() {
        let snapshot = RegistrySnapshot::new(
            Arc::new(UnitTransformer),
            vec![spam_model("SVM"), spam_model("Naive_Bayes")],
        );
        let pipeline = PredictionPipeline::from_snapshot(Config::default(), snapshot);

        let verdict = pipeline.predict_single("free money").unwrap();
        assert_eq!(verdict.prediction, Verdict::Spam);
        assert_eq!(verdict.spam_score(), "2/2 Models");
    }

    #[test]
    fn test_missing_transformer_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictionPipeline::new(config_in(dir.path()));

        let err = pipeline.predict_single("hello").unwrap_err();
        assert!(matches!(err, SpamError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_degraded_snapshot_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictionPipeline::from_snapshot(
            config_in(dir.path()),
            RegistrySnapshot::new(Arc::new(UnitTransformer), vec![]),
        );

        // The degraded slot triggers a load, which fails without a transformer
        assert!(pipeline.predict_single("hello").is_err());
    }

    #[test]
    fn test_run_prediction_uses_batch_model() {
        let snapshot = RegistrySnapshot::new(Arc::new(UnitTransformer), vec![spam_model("SVM")]);
        let pipeline = PredictionPipeline::from_snapshot(Config::default(), snapshot);
        let record = MailRecord {
            time: String::new(),
            recipients: Default::default(),
            subject: Default::default(),
            body: crate::text::normalize("hi"),
            category: crate::mailbox::Category::Inbox,
            direction: crate::mailbox::Direction::Received,
        };

        let scored = pipeline.run_prediction(vec![record]).unwrap();
        assert_eq!(scored[0].prediction, Verdict::Spam);
    }
}
