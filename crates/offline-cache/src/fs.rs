//! Filesystem store backend.
//!
//! Each generation is one JSON file, `<root>/<generation>.json`, holding every
//! entry of that generation. Writes go to a temporary file that is renamed over
//! the original.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use offline_core::RequestKey;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::entry::{CacheEntry, CachedResponse};
use crate::error::{CacheError, CacheResult};
use crate::generation::GenerationId;
use crate::storage::{ensure_cacheable, CacheStorage};

const EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct GenerationFile {
    generation: GenerationId,
    entries: Vec<CacheEntry>,
}

/// Store that persists generations under a directory.
#[derive(Debug)]
pub struct FsCacheStorage {
    root: PathBuf,
    io: Mutex<()>,
}

impl FsCacheStorage {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            io: Mutex::new(()),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, generation: &GenerationId) -> CacheResult<PathBuf> {
        if !generation.is_path_safe() {
            return Err(CacheError::InvalidGeneration(generation.to_string()));
        }
        Ok(self
            .root
            .join(format!("{}.{}", generation.as_str(), EXTENSION)))
    }

    async fn load(&self, generation: &GenerationId) -> CacheResult<Option<BTreeMap<RequestKey, CachedResponse>>> {
        let path = self.path_for(generation)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: GenerationFile = serde_json::from_slice(&bytes)?;
        Ok(Some(
            file.entries
                .into_iter()
                .map(|entry| (entry.key, entry.response))
                .collect(),
        ))
    }

    async fn save(
        &self,
        generation: &GenerationId,
        entries: BTreeMap<RequestKey, CachedResponse>,
    ) -> CacheResult<()> {
        let path = self.path_for(generation)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let file = GenerationFile {
            generation: generation.clone(),
            entries: entries
                .into_iter()
                .map(|(key, response)| CacheEntry { key, response })
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::trace!(generation = %generation, path = %path.display(), "generation file written");
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for FsCacheStorage {
    async fn open(&self, generation: &GenerationId) -> CacheResult<()> {
        let _guard = self.io.lock().await;
        if self.load(generation).await?.is_none() {
            self.save(generation, BTreeMap::new()).await?;
        }
        Ok(())
    }

    async fn has(&self, generation: &GenerationId) -> CacheResult<bool> {
        let path = self.path_for(generation)?;
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn match_entry(
        &self,
        generation: &GenerationId,
        key: &RequestKey,
    ) -> CacheResult<Option<CachedResponse>> {
        let _guard = self.io.lock().await;
        Ok(self
            .load(generation)
            .await?
            .and_then(|mut entries| entries.remove(key)))
    }

    async fn put(
        &self,
        generation: &GenerationId,
        key: RequestKey,
        response: CachedResponse,
    ) -> CacheResult<()> {
        ensure_cacheable(&key)?;
        let _guard = self.io.lock().await;
        let mut entries = self.load(generation).await?.unwrap_or_default();
        entries.insert(key, response);
        self.save(generation, entries).await
    }

    async fn delete_entry(&self, generation: &GenerationId, key: &RequestKey) -> CacheResult<bool> {
        let _guard = self.io.lock().await;
        let Some(mut entries) = self.load(generation).await? else {
            return Ok(false);
        };
        let removed = entries.remove(key).is_some();
        if removed {
            self.save(generation, entries).await?;
        }
        Ok(removed)
    }

    async fn delete_generation(&self, generation: &GenerationId) -> CacheResult<bool> {
        let path = self.path_for(generation)?;
        let _guard = self.io.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn generations(&self) -> CacheResult<Vec<GenerationId>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut generations = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                generations.push(GenerationId::new(stem));
            }
        }
        generations.sort();
        Ok(generations)
    }

    async fn keys(&self, generation: &GenerationId) -> CacheResult<Vec<RequestKey>> {
        let _guard = self.io.lock().await;
        Ok(self
            .load(generation)
            .await?
            .map(|entries| entries.into_keys().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offline_core::{Request, Response};

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("offline-cache-test-{:016x}", rand::random::<u64>()))
    }

    fn key(url: &str) -> RequestKey {
        Request::get(url).unwrap().key()
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let root = temp_root();
        let gen = GenerationId::new("shop-v1");

        {
            let storage = FsCacheStorage::new(&root);
            storage.open(&gen).await.unwrap();
            storage
                .put(&gen, key("https://a.example/app.js"), CachedResponse::from_response(&Response::ok("js")))
                .await
                .unwrap();
        }

        let storage = FsCacheStorage::new(&root);
        let hit = storage.match_entry(&gen, &key("https://a.example/app.js")).await.unwrap();
        assert_eq!(hit.unwrap().body, b"js");
        assert_eq!(storage.keys(&gen).await.unwrap().len(), 1);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_generation_listing_and_delete() {
        let root = temp_root();
        let storage = FsCacheStorage::new(&root);

        assert!(storage.generations().await.unwrap().is_empty());

        storage.open(&GenerationId::new("v1")).await.unwrap();
        storage.open(&GenerationId::new("v2")).await.unwrap();
        assert_eq!(
            storage.generations().await.unwrap(),
            vec![GenerationId::new("v1"), GenerationId::new("v2")]
        );

        assert!(storage.delete_generation(&GenerationId::new("v1")).await.unwrap());
        assert!(!storage.delete_generation(&GenerationId::new("v1")).await.unwrap());
        assert!(!storage.has(&GenerationId::new("v1")).await.unwrap());
        assert!(storage.has(&GenerationId::new("v2")).await.unwrap());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_unsafe_generation_names() {
        let storage = FsCacheStorage::new(temp_root());
        let err = storage.open(&GenerationId::new("../escape")).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidGeneration(_)));
    }

    #[tokio::test]
    async fn test_delete_entry_from_missing_generation() {
        let storage = FsCacheStorage::new(temp_root());
        let removed = storage
            .delete_entry(&GenerationId::new("v1"), &key("https://a.example/x"))
            .await
            .unwrap();
        assert!(!removed);
    }
}
