//! Classifier artifacts and their registry
//!
//! Trained models are consumed, never produced, here. Each artifact is
//! deserialized into one of two capability variants (label-only or
//! probabilistic) so inference dispatches on a tag instead of probing.

pub mod artifact;
pub mod registry;
pub mod tfidf;
pub mod types;

pub use artifact::{Estimator, ModelArtifact};
pub use registry::{LoadedModel, ModelRegistry, RegistrySnapshot};
pub use tfidf::TfidfVectorizer;
pub use types::*;
