//! Mailbox ingestion
//!
//! - [`mbox`]: splitting an mbox archive into raw messages
//! - [`extractor`]: one raw message to one [`MailRecord`]
//! - [`pipeline`]: whole-archive ingestion and single-model batch scoring
//! - [`export`]: tabular output of records

pub mod export;
pub mod extractor;
pub mod mbox;
pub mod pipeline;
pub mod types;

pub use extractor::MessageExtractor;
pub use mbox::{MboxMessage, MboxReader};
pub use pipeline::{MailboxPipeline, Records};
pub use types::*;
