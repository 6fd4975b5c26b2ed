//! Mailbox pipeline
//!
//! Whole-archive ingestion plus the single-model batch scoring path. Batch
//! scoring deliberately does not consult the ensemble: one model labels
//! every record.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::extractor::MessageExtractor;
use super::mbox::MboxReader;
use super::types::{MailRecord, ScoredRecord};
use crate::ensemble::Verdict;
use crate::error::{Result, SpamError};
use crate::model::RegistrySnapshot;

/// Streaming view of an archive as extracted records
pub struct Records<'a, R: Read> {
    reader: MboxReader<R>,
    extractor: &'a MessageExtractor,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<MailRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let message = self.reader.next()?;
        Some(message.map(|m| {
            debug!("Extracting message from {}", m.from);
            self.extractor.extract(&m.content)
        }))
    }
}

pub struct MailboxPipeline {
    extractor: MessageExtractor,
}

impl MailboxPipeline {
    pub fn new(extractor: MessageExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &MessageExtractor {
        &self.extractor
    }

    /// Open an archive for streaming; a missing file fails here
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Records<'_, File>> {
        Ok(self.records(MboxReader::open(path)?))
    }

    pub fn records<R: Read>(&self, reader: MboxReader<R>) -> Records<'_, R> {
        Records {
            reader,
            extractor: &self.extractor,
        }
    }

    /// Read every message of an archive into records, in archive order
    pub fn ingest<P: AsRef<Path>>(&self, path: P) -> Result<Vec<MailRecord>> {
        let path = path.as_ref();
        let start = Instant::now();
        info!("Reading mailbox {}", path.display());

        let records = self.open(path)?.collect::<Result<Vec<_>>>()?;

        info!(
            "Extracted {} messages in {:.2?}",
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }

    /// Label each record with a single model
    ///
    /// Uses `model_name` when loaded, otherwise the first loaded model. The
    /// record body is already normalized and goes to the transformer as is.
    pub fn score(
        &self,
        records: Vec<MailRecord>,
        snapshot: &RegistrySnapshot,
        model_name: &str,
    ) -> Result<Vec<ScoredRecord>> {
        let model = match snapshot.model(model_name) {
            Some(model) => model,
            None => {
                let fallback = snapshot.models().first().ok_or(SpamError::NoModels)?;
                warn!(
                    "Batch model {} not loaded, using {}",
                    model_name,
                    fallback.name()
                );
                fallback
            }
        };

        let start = Instant::now();
        let mut spam = 0;

        let scored: Vec<ScoredRecord> = records
            .into_iter()
            .map(|record| {
                let prediction = match snapshot
                    .features(&record.body)
                    .and_then(|features| model.classifier().predict(&features))
                {
                    Ok(code) => Verdict::from(model.labels().decode(code)),
                    Err(e) => {
                        warn!("{} failed on record: {}", model.name(), e);
                        Verdict::Error
                    }
                };
                if prediction == Verdict::Spam {
                    spam += 1;
                }
                ScoredRecord { record, prediction }
            })
            .collect();

        debug!("Scored with {}", model.name());
        info!(
            "Predicted {} records ({} spam) in {:.2?}",
            scored.len(),
            spam,
            start.elapsed()
        );
        Ok(scored)
    }
}

impl Default for MailboxPipeline {
    fn default() -> Self {
        Self::new(MessageExtractor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::Category;
    use crate::model::{
        Classifier, FeatureTransformer, LabelEncoding, LoadedModel, MockLabelClassifier, ModelError,
    };
    use crate::text::NormalizedText;
    use std::io::Cursor;
    use std::sync::Arc;

    const ARCHIVE: &str = "\
From a@example.com Mon Jan  1 00:00:00 2024
From: a@example.com
Subject: first
X-Gmail-Labels: Spam

win money
From b@example.com Mon Jan  1 00:00:00 2024
From: b@example.com
Subject: second

see you
";

    struct LengthTransformer;

    impl FeatureTransformer for LengthTransformer {
        fn transform(&self, texts: &[NormalizedText]) -> std::result::Result<Vec<Vec<f64>>, ModelError> {
            Ok(texts.iter().map(|t| vec![t.len() as f64]).collect())
        }

        fn width(&self) -> usize {
            1
        }
    }

    fn snapshot(models: Vec<LoadedModel>) -> RegistrySnapshot {
        RegistrySnapshot::new(Arc::new(LengthTransformer), models)
    }

    fn label_model(name: &str, code: Option<i64>) -> LoadedModel {
        let mut clf = MockLabelClassifier::new();
        clf.expect_predict().returning(move |_| match code {
            Some(code) => Ok(code),
            None => Err(ModelError::EmptyOutput),
        });
        LoadedModel::new(name, Classifier::LabelOnly(Box::new(clf)), LabelEncoding::default())
    }

    fn records() -> Vec<MailRecord> {
        let pipeline = MailboxPipeline::default();
        pipeline
            .records(MboxReader::new(Cursor::new(ARCHIVE)))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_records_in_archive_order() {
        let records = records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject.as_str(), "first");
        assert_eq!(records[0].category, Category::Spam);
        assert_eq!(records[1].subject.as_str(), "second");
        assert_eq!(records[1].category, Category::Inbox);
    }

    #[test]
    fn test_ingest_missing_file() {
        let err = MailboxPipeline::default()
            .ingest("/nonexistent/archive.mbox")
            .unwrap_err();
        assert!(matches!(err, SpamError::MailboxNotFound(_)));
    }

    #[test]
    fn test_score_uses_named_model() {
        let snapshot = snapshot(vec![label_model("SVM", Some(1)), label_model("Batch", Some(0))]);
        let scored = MailboxPipeline::default()
            .score(records(), &snapshot, "Batch")
            .unwrap();

        assert!(scored.iter().all(|s| s.prediction == Verdict::Spam));
    }

    #[test]
    fn test_score_falls_back_to_first_model() {
        let snapshot = snapshot(vec![label_model("SVM", Some(1))]);
        let scored = MailboxPipeline::default()
            .score(records(), &snapshot, "Missing")
            .unwrap();

        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|s| s.prediction == Verdict::Ham));
    }

    #[test]
    fn test_score_record_failure_is_contained() {
        let snapshot = snapshot(vec![label_model("SVM", None)]);
        let scored = MailboxPipeline::default()
            .score(records(), &snapshot, "SVM")
            .unwrap();

        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|s| s.prediction == Verdict::Error));
    }

    #[test]
    fn test_score_without_models() {
        let err = MailboxPipeline::default()
            .score(records(), &snapshot(vec![]), "SVM")
            .unwrap_err();
        assert!(matches!(err, SpamError::NoModels));
    }
}
