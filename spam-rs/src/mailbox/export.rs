//! CSV export of mailbox records
//!
//! Columns follow [`MailRecord`] field order; scored output appends a
//! `Prediction` column. Cells are already bounded and formula-guarded by
//! the normalizer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::types::{Category, Direction, MailRecord, ScoredRecord};
use crate::ensemble::Verdict;
use crate::error::Result;
use crate::text::NormalizedText;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScoredRow<'a> {
    time: &'a str,
    recipients: &'a NormalizedText,
    subject: &'a NormalizedText,
    body: &'a NormalizedText,
    category: Category,
    direction: Direction,
    prediction: Verdict,
}

impl<'a> From<&'a ScoredRecord> for ScoredRow<'a> {
    fn from(scored: &'a ScoredRecord) -> Self {
        let record = &scored.record;
        Self {
            time: &record.time,
            recipients: &record.recipients,
            subject: &record.subject,
            body: &record.body,
            category: record.category,
            direction: record.direction,
            prediction: scored.prediction,
        }
    }
}

pub fn write_records_to<W: Write>(writer: W, records: &[MailRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_scored_to<W: Write>(writer: W, records: &[ScoredRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(ScoredRow::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write unscored records to `path`, replacing any existing file
pub fn write_records<P: AsRef<Path>>(path: P, records: &[MailRecord]) -> Result<()> {
    let path = path.as_ref();
    write_records_to(BufWriter::new(File::create(path)?), records)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn write_scored<P: AsRef<Path>>(path: P, records: &[ScoredRecord]) -> Result<()> {
    let path = path.as_ref();
    write_scored_to(BufWriter::new(File::create(path)?), records)?;
    info!("Wrote {} scored records to {}", records.len(), path.display());
    Ok(())
}
