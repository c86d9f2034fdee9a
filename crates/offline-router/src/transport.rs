//! Network transport boundary.

use async_trait::async_trait;
use offline_core::{Request, Response};

use crate::error::FetchError;

/// Transport-level cache directive for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Let the transport apply its usual HTTP caching.
    #[default]
    Default,
    /// Bypass and do not populate any transport cache.
    NoStore,
}

/// Per-fetch options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// Transport cache directive.
    pub cache: CacheMode,
}

impl FetchOptions {
    /// Options with transport caching disabled.
    pub fn no_store() -> Self {
        Self {
            cache: CacheMode::NoStore,
        }
    }
}

/// Sends requests to the network.
///
/// An HTTP error status is still a successful fetch; only failures to obtain a
/// response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a request.
    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, FetchError>;
}
