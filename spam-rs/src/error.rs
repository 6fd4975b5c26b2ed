use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Corrupt artifact {path}: {reason}")]
    CorruptArtifact { path: String, reason: String },

    #[error("Mailbox not found: {0}")]
    MailboxNotFound(String),

    #[error("No models available")]
    NoModels,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SpamError>;
