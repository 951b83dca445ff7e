use thiserror::Error;

/// Rejection of caller input, raised before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("invalid project slug: '{0}' (lowercase alphanumerics, '-' and '_' only)")]
    InvalidProject(String),

    #[error("unknown category: '{0}'")]
    UnknownCategory(String),

    #[error("invalid memory id: '{0}'")]
    InvalidId(String),

    #[error("search query must not be empty")]
    EmptyQuery,
}
