//! In-memory store backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use offline_core::RequestKey;

use crate::entry::CachedResponse;
use crate::error::{CacheError, CacheResult};
use crate::generation::GenerationId;
use crate::storage::{ensure_cacheable, CacheStorage};

type Generations = BTreeMap<GenerationId, HashMap<RequestKey, CachedResponse>>;

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCacheStorage {
    generations: RwLock<Generations>,
}

impl InMemoryCacheStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all generations.
    pub fn len(&self) -> usize {
        self.read()
            .map(|g| g.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> CacheResult<RwLockReadGuard<'_, Generations>> {
        self.generations
            .read()
            .map_err(|_| CacheError::Storage("store lock poisoned".to_string()))
    }

    fn write(&self) -> CacheResult<RwLockWriteGuard<'_, Generations>> {
        self.generations
            .write()
            .map_err(|_| CacheError::Storage("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn open(&self, generation: &GenerationId) -> CacheResult<()> {
        self.write()?.entry(generation.clone()).or_default();
        Ok(())
    }

    async fn has(&self, generation: &GenerationId) -> CacheResult<bool> {
        Ok(self.read()?.contains_key(generation))
    }

    async fn match_entry(
        &self,
        generation: &GenerationId,
        key: &RequestKey,
    ) -> CacheResult<Option<CachedResponse>> {
        Ok(self
            .read()?
            .get(generation)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        generation: &GenerationId,
        key: RequestKey,
        response: CachedResponse,
    ) -> CacheResult<()> {
        ensure_cacheable(&key)?;
        self.write()?
            .entry(generation.clone())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn delete_entry(&self, generation: &GenerationId, key: &RequestKey) -> CacheResult<bool> {
        Ok(self
            .write()?
            .get_mut(generation)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn delete_generation(&self, generation: &GenerationId) -> CacheResult<bool> {
        Ok(self.write()?.remove(generation).is_some())
    }

    async fn generations(&self) -> CacheResult<Vec<GenerationId>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn keys(&self, generation: &GenerationId) -> CacheResult<Vec<RequestKey>> {
        let mut keys: Vec<RequestKey> = self
            .read()?
            .get(generation)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offline_core::{Method, Request, Response};

    fn key(url: &str) -> RequestKey {
        Request::get(url).unwrap().key()
    }

    fn cached(body: &str) -> CachedResponse {
        CachedResponse::from_response(&Response::ok(body))
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = InMemoryCacheStorage::new();
        let gen = GenerationId::new("v1");

        storage.put(&gen, key("https://a.example/x"), cached("one")).await.unwrap();

        let hit = storage.match_entry(&gen, &key("https://a.example/x")).await.unwrap();
        assert_eq!(hit.unwrap().body, b"one");

        let miss = storage.match_entry(&gen, &key("https://a.example/y")).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let storage = InMemoryCacheStorage::new();
        let gen = GenerationId::new("v1");

        storage.put(&gen, key("https://a.example/x"), cached("one")).await.unwrap();
        storage.put(&gen, key("https://a.example/x"), cached("two")).await.unwrap();

        assert_eq!(storage.len(), 1);
        let hit = storage.match_entry(&gen, &key("https://a.example/x")).await.unwrap();
        assert_eq!(hit.unwrap().body, b"two");
    }

    #[tokio::test]
    async fn test_put_rejects_non_idempotent_method() {
        let storage = InMemoryCacheStorage::new();
        let gen = GenerationId::new("v1");
        let post = Request::new(Method::POST, "https://a.example/x").unwrap().key();

        let err = storage.put(&gen, post, cached("x")).await.unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedMethod(m) if m == "POST"));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let storage = InMemoryCacheStorage::new();
        let old = GenerationId::new("v1");
        let new = GenerationId::new("v2");

        storage.put(&old, key("https://a.example/x"), cached("old")).await.unwrap();
        storage.open(&new).await.unwrap();

        assert!(storage.match_entry(&new, &key("https://a.example/x")).await.unwrap().is_none());
        assert_eq!(storage.generations().await.unwrap(), vec![old.clone(), new.clone()]);

        assert!(storage.delete_generation(&old).await.unwrap());
        assert!(!storage.delete_generation(&old).await.unwrap());
        assert_eq!(storage.generations().await.unwrap(), vec![new]);
    }

    #[tokio::test]
    async fn test_delete_entry_and_keys() {
        let storage = InMemoryCacheStorage::new();
        let gen = GenerationId::new("v1");

        storage.put(&gen, key("https://a.example/b"), cached("b")).await.unwrap();
        storage.put(&gen, key("https://a.example/a"), cached("a")).await.unwrap();

        let keys = storage.keys(&gen).await.unwrap();
        assert_eq!(keys[0].url, "https://a.example/a");
        assert_eq!(keys.len(), 2);

        assert!(storage.delete_entry(&gen, &key("https://a.example/a")).await.unwrap());
        assert!(!storage.delete_entry(&gen, &key("https://a.example/a")).await.unwrap());
        assert_eq!(storage.keys(&gen).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let storage = InMemoryCacheStorage::new();
        let gen = GenerationId::new("v1");

        storage.put(&gen, key("https://a.example/x"), cached("x")).await.unwrap();
        storage.open(&gen).await.unwrap();

        assert!(storage.has(&gen).await.unwrap());
        assert_eq!(storage.len(), 1);
    }
}
