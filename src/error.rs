use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("embedding model '{model_id}' is unavailable: {reason}")]
    ModelUnavailable { model_id: String, reason: String },

    #[error("embedding backend '{model_id}' failed: {reason}")]
    Embedding { model_id: String, reason: String },

    #[error("failed to load corpus {}: {reason}", path.display())]
    Corpus { path: PathBuf, reason: String },

    #[error("cache I/O failed at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid engine configuration: {0}")]
    Config(String),
}

/// Reason a cache artifact was rejected. Consumed by the index builder,
/// which recomputes instead of surfacing it.
#[derive(Debug, Error)]
pub enum CacheLoadFailure {
    #[error("cache manifest {} is missing", path.display())]
    Missing { path: PathBuf },

    #[error("cache artifact {} is unreadable: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("cache artifact does not match the corpus: {0}")]
    Mismatch(String),

    #[error("cache blob is malformed: {0}")]
    Malformed(String),
}

impl CacheLoadFailure {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}
