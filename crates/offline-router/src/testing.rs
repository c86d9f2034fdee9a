//! Test doubles for the transport and store boundaries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use offline_cache::{CacheResult, CacheStorage, CachedResponse, GenerationId, InMemoryCacheStorage};
use offline_core::{Request, RequestKey, Response, RouterEvent, RouterObserver};

use crate::error::FetchError;
use crate::transport::{FetchOptions, Transport};

pub const ORIGIN: &str = "https://shop.example.com";

/// Scripted transport. Unknown URLs fail with a network error.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Result<Response, FetchError>>>,
    calls: Mutex<Vec<(String, FetchOptions)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(response));
    }

    pub fn fail(&self, url: &str, error: FetchError) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    pub fn last_options(&self, url: &str) -> Option<FetchOptions> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .map(|(_, options)| *options)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, FetchError> {
        let url = request.url_string();
        self.calls.lock().unwrap().push((url.clone(), options));

        self.routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Network(format!("no route for {}", url))))
    }
}

/// In-memory store that counts every read and write.
#[derive(Default)]
pub struct CountingStorage {
    inner: InMemoryCacheStorage,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for CountingStorage {
    async fn open(&self, generation: &GenerationId) -> CacheResult<()> {
        self.write();
        self.inner.open(generation).await
    }

    async fn has(&self, generation: &GenerationId) -> CacheResult<bool> {
        self.read();
        self.inner.has(generation).await
    }

    async fn match_entry(
        &self,
        generation: &GenerationId,
        key: &RequestKey,
    ) -> CacheResult<Option<CachedResponse>> {
        self.read();
        self.inner.match_entry(generation, key).await
    }

    async fn put(
        &self,
        generation: &GenerationId,
        key: RequestKey,
        response: CachedResponse,
    ) -> CacheResult<()> {
        self.write();
        self.inner.put(generation, key, response).await
    }

    async fn delete_entry(&self, generation: &GenerationId, key: &RequestKey) -> CacheResult<bool> {
        self.write();
        self.inner.delete_entry(generation, key).await
    }

    async fn delete_generation(&self, generation: &GenerationId) -> CacheResult<bool> {
        self.write();
        self.inner.delete_generation(generation).await
    }

    async fn generations(&self) -> CacheResult<Vec<GenerationId>> {
        self.read();
        self.inner.generations().await
    }

    async fn keys(&self, generation: &GenerationId) -> CacheResult<Vec<RequestKey>> {
        self.read();
        self.inner.keys(generation).await
    }
}

/// Observer that records event names in order.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn names(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RouterObserver for RecordingObserver {
    fn on_event(&self, event: &RouterEvent) {
        let name = match event {
            RouterEvent::Installing { .. } => "installing",
            RouterEvent::SeedCached { .. } => "seed_cached",
            RouterEvent::SeedFailed { .. } => "seed_failed",
            RouterEvent::Installed { .. } => "installed",
            RouterEvent::GenerationEvicted { .. } => "generation_evicted",
            RouterEvent::Activated { .. } => "activated",
            RouterEvent::Routed { .. } => "routed",
            RouterEvent::RouteFailed { .. } => "route_failed",
            RouterEvent::StoreWriteFailed { .. } => "store_write_failed",
        };
        self.events.lock().unwrap().push(name.to_string());
    }
}
