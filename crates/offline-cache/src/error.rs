//! Cache error types.

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Only GET and HEAD requests may be stored.
    #[error("method {0} cannot be cached")]
    UnsupportedMethod(String),

    /// Generation name unusable by the backend.
    #[error("invalid generation name: {0}")]
    InvalidGeneration(String),

    /// Failed to serialize/deserialize a stored entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}
