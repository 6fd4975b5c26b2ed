//! spam-rs: Spam/ham classification for single messages and mbox archives
//!
//! Runs a set of pre-trained classifiers over one shared feature
//! transformer and reports a majority verdict.
//!
//! # Features
//!
//! - **Ensemble**: Strict-majority vote with per-model results and confidence
//! - **Mailbox**: mbox ingestion with MIME-aware body extraction
//! - **Batch**: Single-model scoring of whole archives with CSV export
//! - **Snapshots**: Model sets are loaded atomically and shared read-only
//!
//! # Example
//!
//! ```no_run
//! use spam_rs::config::Config;
//! use spam_rs::pipeline::PredictionPipeline;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default("config.toml")?;
//!     let pipeline = PredictionPipeline::new(config);
//!
//!     let verdict = pipeline.predict_single("WIN a FREE prize, call now!")?;
//!     println!("{} ({})", verdict.prediction, verdict.spam_score());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod ensemble;
pub mod error;
pub mod mailbox;
pub mod model;
pub mod pipeline;
pub mod text;

pub use config::Config;
pub use ensemble::{EnsembleVerdict, Verdict};
pub use error::{Result, SpamError};
pub use pipeline::PredictionPipeline;
