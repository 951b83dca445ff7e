use thiserror::Error;

/// Errors surfaced by the semantic index and its collaborators.
///
/// Transient failures are worth one retry; permanent ones are not. Timeouts
/// count as transient from the caller's perspective.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding failed: {reason}")]
    Embedding { reason: String, transient: bool },

    #[error("vector engine failure: {reason}")]
    Engine { reason: String, transient: bool },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("timed out during {0}")]
    Timeout(&'static str),
}

impl IndexError {
    pub fn embedding_transient(reason: impl Into<String>) -> Self {
        Self::Embedding {
            reason: reason.into(),
            transient: true,
        }
    }

    pub fn embedding_permanent(reason: impl Into<String>) -> Self {
        Self::Embedding {
            reason: reason.into(),
            transient: false,
        }
    }

    pub fn engine_transient(reason: impl Into<String>) -> Self {
        Self::Engine {
            reason: reason.into(),
            transient: true,
        }
    }

    pub fn engine_permanent(reason: impl Into<String>) -> Self {
        Self::Engine {
            reason: reason.into(),
            transient: false,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding { transient, .. } | Self::Engine { transient, .. } => *transient,
            Self::Timeout(_) => true,
            Self::Dimension { .. } => false,
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
