use std::path::PathBuf;

use recall_types::MemoryId;
use thiserror::Error;

/// Errors surfaced by the file store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memory not found: {0}")]
    NotFound(MemoryId),

    #[error("malformed memory file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("timed out during {0}")]
    Timeout(&'static str),

    #[error("io failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Timeouts are safe to retry; everything else needs caller judgment.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
