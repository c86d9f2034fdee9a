//! The store boundary.

use async_trait::async_trait;
use offline_core::RequestKey;

use crate::entry::CachedResponse;
use crate::error::{CacheError, CacheResult};
use crate::generation::GenerationId;

/// Key-value response store addressed by generation.
///
/// Each generation holds at most one entry per request key, and only GET/HEAD
/// keys are accepted. Writes to an existing key replace the entry.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if absent.
    async fn open(&self, generation: &GenerationId) -> CacheResult<()>;

    /// Check whether a generation exists.
    async fn has(&self, generation: &GenerationId) -> CacheResult<bool>;

    /// Look up an entry.
    async fn match_entry(
        &self,
        generation: &GenerationId,
        key: &RequestKey,
    ) -> CacheResult<Option<CachedResponse>>;

    /// Store an entry, creating the generation if needed.
    async fn put(
        &self,
        generation: &GenerationId,
        key: RequestKey,
        response: CachedResponse,
    ) -> CacheResult<()>;

    /// Delete an entry. Returns whether it existed.
    async fn delete_entry(&self, generation: &GenerationId, key: &RequestKey) -> CacheResult<bool>;

    /// Delete a whole generation. Returns whether it existed.
    async fn delete_generation(&self, generation: &GenerationId) -> CacheResult<bool>;

    /// List all generations.
    async fn generations(&self) -> CacheResult<Vec<GenerationId>>;

    /// List the keys stored in a generation.
    async fn keys(&self, generation: &GenerationId) -> CacheResult<Vec<RequestKey>>;
}

/// Reject keys that may not have entries.
pub fn ensure_cacheable(key: &RequestKey) -> CacheResult<()> {
    if key.is_cacheable() {
        Ok(())
    } else {
        Err(CacheError::UnsupportedMethod(key.method.clone()))
    }
}
