//! Error types for requests and configuration.

/// A URL that could not be turned into a request target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid URL '{url}': {reason}")]
pub struct UrlError {
    /// The offending URL.
    pub url: String,
    /// Why it was rejected.
    pub reason: String,
}

impl UrlError {
    pub(crate) fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Error type for router configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("generation id must not be empty")]
    EmptyGeneration,

    #[error("origin must be an absolute http(s) URL: {0}")]
    InvalidOrigin(String),

    #[error("invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    InvalidUrl(#[from] UrlError),
}
