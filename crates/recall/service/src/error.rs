use recall_index::IndexError;
use recall_store::StoreError;
use recall_types::ValidationError;
use thiserror::Error;

/// Errors surfaced by the memory service facade.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl ServiceError {
    /// True when the failure names a memory id the store does not hold.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound(_)))
    }

    /// True when the same call may succeed under a fresh deadline.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Store(err) => err.is_retryable(),
            Self::Index(err) => err.is_transient(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
