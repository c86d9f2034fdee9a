//! Router error types.

use offline_cache::CacheError;
use offline_core::{UrlError, WorkerState};

/// Error type for transport fetches.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The network could not be reached or the fetch was rejected.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be sent as built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out")]
    Timeout,
}

/// Failure handed back to the caller of `route`.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The network fetch failed and no fallback applied.
    #[error("network failure for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: FetchError,
    },

    /// A cross-origin response from an opaque host could not be used.
    #[error("cross-origin response unusable for {url}: {source}")]
    OpaqueResponse {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The request URL could not be resolved.
    #[error(transparent)]
    InvalidRequest(#[from] UrlError),
}

impl RouteError {
    /// Whether this is a network failure (of either kind).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::OpaqueResponse { .. })
    }
}

/// Error type for lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("cannot move from {from} to {to}")]
    Lifecycle { from: WorkerState, to: WorkerState },

    #[error(transparent)]
    Storage(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] offline_core::ConfigError),
}
