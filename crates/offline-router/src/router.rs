//! The cache router: lifecycle and per-request strategy dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use futures::future::join_all;
use offline_cache::{CacheStorage, CachedResponse, GenerationId};
use offline_core::{
    CacheStatus, ClientId, ConfigError, Request, RequestId, RequestKey, Response, RouterConfig,
    RouterEvent, RouterObserver, Strategy, Uri, WorkerState,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::clients::ClientRegistry;
use crate::error::{FetchError, RouteError, RouterError};
use crate::rules::{RoutingRule, RoutingTable};
use crate::transport::{FetchOptions, Transport};

/// A seed URL that could not be cached during install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    /// Seed URL as configured.
    pub url: String,
    /// Why it failed.
    pub reason: String,
}

/// Result of `install`.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Generation that was seeded.
    pub generation: GenerationId,
    /// Seeds stored successfully.
    pub cached: Vec<String>,
    /// Seeds that failed; installation still completed.
    pub failed: Vec<SeedFailure>,
}

impl InstallReport {
    /// Whether every seed was stored.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of `activate`.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    /// The generation now in control.
    pub generation: GenerationId,
    /// Retired generations that were deleted.
    pub evicted: Vec<GenerationId>,
    /// Clients whose controller changed.
    pub claimed_clients: usize,
}

/// A routed response together with how it was produced.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    /// Request ID assigned for tracing.
    pub request_id: RequestId,
    /// The response handed back to the caller.
    pub response: Response,
    /// Name of the rule that matched.
    pub rule: &'static str,
    /// Strategy applied.
    pub strategy: Strategy,
    /// Where the response came from.
    pub cache_status: CacheStatus,
}

/// Request-interception router owning one cache generation.
///
/// Shared across tasks as `Arc<CacheRouter>`. Every intercepted request goes
/// through [`CacheRouter::route`], which picks the first matching rule and
/// applies its strategy against the store and the transport.
pub struct CacheRouter {
    config: RouterConfig,
    generation: GenerationId,
    origin: Uri,
    table: RoutingTable,
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
    observers: Vec<Arc<dyn RouterObserver>>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    clients: ClientRegistry,
    pending: Mutex<JoinSet<()>>,
}

impl CacheRouter {
    /// Create a router from configuration.
    pub fn new(
        config: RouterConfig,
        storage: Arc<dyn CacheStorage>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let table = RoutingTable::from_config(&config)?;
        let origin = config.origin_uri()?;

        Ok(Self {
            generation: GenerationId::new(config.generation_id.clone()),
            config,
            origin,
            table,
            storage,
            transport,
            observers: Vec::new(),
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients: ClientRegistry::new(),
            pending: Mutex::new(JoinSet::new()),
        })
    }

    /// Attach an observer.
    pub fn with_observer(mut self, observer: Arc<dyn RouterObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The configuration this router was built from.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The generation this router owns.
    pub fn generation(&self) -> &GenerationId {
        &self.generation
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether install asked to activate without waiting for old clients.
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Client contexts known to this router.
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Register a client. It is controlled immediately once the router is active.
    pub fn register_client(&self, client: ClientId) {
        let controller = (self.state() == WorkerState::Activated).then(|| self.generation.clone());
        self.clients.register(client, controller);
    }

    /// The rule a request would be routed by, without any I/O.
    ///
    /// Relative URLs are classified as if resolved against the configured origin.
    pub fn classify(&self, request: &Request) -> &RoutingRule {
        match request.clone().resolve(&self.origin) {
            Ok(resolved) => self.table.classify(&resolved),
            Err(_) => self.table.classify(request),
        }
    }

    /// Seed the store with the configured seed URLs.
    pub async fn install(&self) -> Result<InstallReport, RouterError> {
        let seeds = self.config.seed_urls.clone();
        self.install_urls(&seeds).await
    }

    /// Seed the store with an explicit list of URLs.
    ///
    /// Seeds are fetched concurrently and fail independently; only failing to
    /// open the store aborts installation.
    pub async fn install_urls<S: AsRef<str>>(&self, urls: &[S]) -> Result<InstallReport, RouterError> {
        self.transition(WorkerState::Installing)?;

        info!(generation = %self.generation, seeds = urls.len(), "installing");
        self.emit(RouterEvent::Installing {
            generation: self.generation.to_string(),
            seeds: urls.len(),
        });

        if let Err(e) = self.storage.open(&self.generation).await {
            self.set_state(WorkerState::Redundant);
            return Err(e.into());
        }

        let results = join_all(urls.iter().map(|url| self.seed(url.as_ref()))).await;

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for result in results {
            match result {
                Ok(url) => cached.push(url),
                Err(failure) => failed.push(failure),
            }
        }

        self.set_state(WorkerState::Installed);
        self.skip_waiting.store(true, Ordering::Release);

        info!(
            generation = %self.generation,
            cached = cached.len(),
            failed = failed.len(),
            "installed"
        );
        self.emit(RouterEvent::Installed {
            generation: self.generation.to_string(),
            cached: cached.len(),
            failed: failed.len(),
        });

        Ok(InstallReport {
            generation: self.generation.clone(),
            cached,
            failed,
        })
    }

    async fn seed(&self, url: &str) -> Result<String, SeedFailure> {
        match self.fetch_seed(url).await {
            Ok(()) => {
                debug!(url, "seed cached");
                self.emit(RouterEvent::SeedCached {
                    url: url.to_string(),
                });
                Ok(url.to_string())
            }
            Err(reason) => {
                warn!(url, %reason, "seed failed");
                self.emit(RouterEvent::SeedFailed {
                    url: url.to_string(),
                    reason: reason.clone(),
                });
                Err(SeedFailure {
                    url: url.to_string(),
                    reason,
                })
            }
        }
    }

    async fn fetch_seed(&self, url: &str) -> Result<(), String> {
        let request = Request::get(url)
            .and_then(|r| r.resolve(&self.origin))
            .map_err(|e| e.to_string())?;

        let response = self
            .transport
            .fetch(&request, FetchOptions::default())
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_ok() {
            return Err(format!("unexpected status {}", response.status));
        }

        self.storage
            .put(
                &self.generation,
                request.key(),
                CachedResponse::from_response(&response),
            )
            .await
            .map_err(|e| e.to_string())
    }

    /// Retire every other generation and take control of all clients.
    pub async fn activate(&self) -> Result<ActivateReport, RouterError> {
        self.transition(WorkerState::Activating)?;

        let evicted = match self.evict_stale().await {
            Ok(evicted) => evicted,
            Err(e) => {
                self.set_state(WorkerState::Redundant);
                return Err(e);
            }
        };

        let claimed_clients = self.clients.claim(&self.generation);
        self.set_state(WorkerState::Activated);

        info!(
            generation = %self.generation,
            evicted = evicted.len(),
            claimed_clients,
            "activated"
        );
        self.emit(RouterEvent::Activated {
            generation: self.generation.to_string(),
            claimed_clients,
        });

        Ok(ActivateReport {
            generation: self.generation.clone(),
            evicted,
            claimed_clients,
        })
    }

    async fn evict_stale(&self) -> Result<Vec<GenerationId>, RouterError> {
        let mut evicted = Vec::new();
        for generation in self.storage.generations().await? {
            if generation == self.generation {
                continue;
            }
            if self.storage.delete_generation(&generation).await? {
                debug!(%generation, "generation evicted");
                self.emit(RouterEvent::GenerationEvicted {
                    generation: generation.to_string(),
                });
                evicted.push(generation);
            }
        }
        Ok(evicted)
    }

    /// Route one intercepted request.
    pub async fn route(&self, request: Request) -> Result<RouteOutcome, RouteError> {
        let request_id = RequestId::generate();
        let start = Instant::now();

        let request = request.resolve(&self.origin)?;
        let rule = self.table.classify(&request);
        let (rule_name, strategy) = (rule.name(), rule.strategy);

        let result = match strategy {
            Strategy::Passthrough | Strategy::NetworkOnly => self
                .fetch(&request, FetchOptions::default())
                .await
                .map(|response| (response, CacheStatus::Bypass)),
            Strategy::OpaquePassthrough => self
                .transport
                .fetch(&request, FetchOptions::default())
                .await
                .map(|response| (response, CacheStatus::Bypass))
                .map_err(|source| RouteError::OpaqueResponse {
                    url: request.url_string(),
                    source,
                }),
            Strategy::NetworkNoStore => self
                .fetch(&request, FetchOptions::no_store())
                .await
                .map(|response| (response, CacheStatus::Bypass)),
            Strategy::NetworkFirst => self.network_first(&request).await,
            Strategy::CacheFirst => self.cache_first(&request).await,
        };

        let elapsed = start.elapsed();
        match result {
            Ok((response, cache_status)) => {
                debug!(
                    request_id = %request_id,
                    method = %request.method,
                    url = %request.url,
                    rule = rule_name,
                    strategy = %strategy,
                    status = %cache_status,
                    "routed"
                );
                self.emit(RouterEvent::Routed {
                    request_id: request_id.clone(),
                    method: request.method.to_string(),
                    url: request.url_string(),
                    rule: rule_name,
                    strategy,
                    status: cache_status,
                    elapsed,
                });

                Ok(RouteOutcome {
                    request_id,
                    response,
                    rule: rule_name,
                    strategy,
                    cache_status,
                })
            }
            Err(error) => {
                debug!(
                    request_id = %request_id,
                    url = %request.url,
                    rule = rule_name,
                    strategy = %strategy,
                    %error,
                    "route failed"
                );
                self.emit(RouterEvent::RouteFailed {
                    request_id,
                    url: request.url_string(),
                    rule: rule_name,
                    strategy,
                    error: error.to_string(),
                    elapsed,
                });
                Err(error)
            }
        }
    }

    async fn fetch(&self, request: &Request, options: FetchOptions) -> Result<Response, RouteError> {
        self.transport
            .fetch(request, options)
            .await
            .map_err(|source| network_error(request, source))
    }

    async fn network_first(&self, request: &Request) -> Result<(Response, CacheStatus), RouteError> {
        match self.transport.fetch(request, FetchOptions::default()).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_in_background(request.key(), &response).await;
                }
                Ok((response, CacheStatus::Miss))
            }
            Err(source) => match self.lookup(&request.key()).await {
                Some(cached) => {
                    debug!(url = %request.url, error = %source, "serving stored fallback");
                    Ok((cached.into_response(), CacheStatus::Fallback))
                }
                None => Err(network_error(request, source)),
            },
        }
    }

    async fn cache_first(&self, request: &Request) -> Result<(Response, CacheStatus), RouteError> {
        let key = request.key();
        if let Some(cached) = self.lookup(&key).await {
            return Ok((cached.into_response(), CacheStatus::Hit));
        }

        let response = self.fetch(request, FetchOptions::default()).await?;
        if response.is_ok() && key.is_cacheable() {
            let url = key.url.clone();
            if let Err(e) = self
                .storage
                .put(&self.generation, key, CachedResponse::from_response(&response))
                .await
            {
                warn!(%url, error = %e, "store write failed");
                self.emit(RouterEvent::StoreWriteFailed {
                    url,
                    reason: e.to_string(),
                });
            }
        }
        Ok((response, CacheStatus::Miss))
    }

    /// Look up a stored response; read failures count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        match self.storage.match_entry(&self.generation, key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, error = %e, "store read failed");
                None
            }
        }
    }

    async fn store_in_background(&self, key: RequestKey, response: &Response) {
        let storage = Arc::clone(&self.storage);
        let observers = self.observers.clone();
        let generation = self.generation.clone();
        let snapshot = CachedResponse::from_response(response);

        let mut pending = self.pending.lock().await;
        while let Some(done) = pending.try_join_next() {
            log_join_error(done);
        }

        pending.spawn(async move {
            let url = key.url.clone();
            if let Err(e) = storage.put(&generation, key, snapshot).await {
                warn!(%url, error = %e, "background store write failed");
                let event = RouterEvent::StoreWriteFailed {
                    url,
                    reason: e.to_string(),
                };
                for observer in &observers {
                    observer.on_event(&event);
                }
            }
        });
    }

    /// Wait for all background store writes to finish.
    pub async fn wait_until_idle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.pending.lock().await);
            if pending.is_empty() {
                return;
            }
            while let Some(done) = pending.join_next().await {
                log_join_error(done);
            }
        }
    }

    fn transition(&self, next: WorkerState) -> Result<(), RouterError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            return Err(RouterError::Lifecycle {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }

    fn set_state(&self, next: WorkerState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn emit(&self, event: RouterEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

impl std::fmt::Debug for CacheRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRouter")
            .field("generation", &self.generation)
            .field("origin", &self.origin)
            .field("state", &self.state())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

fn network_error(request: &Request, source: FetchError) -> RouteError {
    RouteError::Network {
        url: request.url_string(),
        source,
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!(error = %e, "background store write aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingStorage, MockTransport, RecordingObserver, ORIGIN};
    use crate::transport::CacheMode;
    use offline_cache::InMemoryCacheStorage;
    use offline_core::{Method, StatusCode};

    fn url(path: &str) -> String {
        format!("{}{}", ORIGIN, path)
    }

    fn config() -> RouterConfig {
        RouterConfig::new("shop-v2")
            .with_origin(ORIGIN)
            .with_seed_urls(&["/a", "/b"])
    }

    fn router_with(
        config: RouterConfig,
        storage: Arc<dyn CacheStorage>,
        transport: Arc<MockTransport>,
    ) -> CacheRouter {
        CacheRouter::new(config, storage, transport).unwrap()
    }

    fn setup() -> (CacheRouter, Arc<CountingStorage>, Arc<MockTransport>) {
        let storage = Arc::new(CountingStorage::new());
        let transport = Arc::new(MockTransport::new());
        let router = router_with(config(), storage.clone(), transport.clone());
        (router, storage, transport)
    }

    #[tokio::test]
    async fn test_non_idempotent_methods_never_touch_store() {
        let (router, storage, transport) = setup();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            transport.respond(&url("/css/site.css"), Response::ok("created"));
            let request = Request::new(method, "/css/site.css")
                .unwrap()
                .with_body("{}");
            let outcome = router.route(request).await.unwrap();
            assert_eq!(outcome.strategy, Strategy::Passthrough);
            assert_eq!(outcome.cache_status, CacheStatus::Bypass);
        }
        router.wait_until_idle().await;

        assert_eq!(storage.reads(), 0);
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn test_passthrough_returns_error_status_as_is() {
        let (router, _, transport) = setup();
        transport.respond(
            &url("/checkout"),
            Response::new(StatusCode::UNPROCESSABLE_ENTITY, "bad cart"),
        );

        let request = Request::new(Method::POST, "/checkout").unwrap();
        let outcome = router.route(request).await.unwrap();
        assert_eq!(outcome.response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(outcome.response.text(), "bad cart");
    }

    #[tokio::test]
    async fn test_dynamic_api_always_hits_network() {
        let (router, storage, transport) = setup();
        let cart = url("/api/commerce/cart/");

        transport.respond(&cart, Response::ok("cart: 1 item"));
        let first = router.route(Request::get("/api/commerce/cart/").unwrap()).await.unwrap();
        assert_eq!(first.response.text(), "cart: 1 item");

        transport.respond(&cart, Response::ok("cart: 2 items"));
        let second = router.route(Request::get("/api/commerce/cart/").unwrap()).await.unwrap();
        assert_eq!(second.response.text(), "cart: 2 items");
        assert_eq!(second.strategy, Strategy::NetworkOnly);

        router.wait_until_idle().await;
        assert_eq!(transport.calls_for(&cart), 2);
        assert_eq!(storage.reads(), 0);
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn test_dynamic_api_ignores_stored_copy() {
        let (router, storage, transport) = setup();
        let cart = url("/api/commerce/cart/");

        transport.respond(&cart, Response::ok("cart: stale"));
        let report = router.install_urls(&["/api/commerce/cart/"]).await.unwrap();
        assert_eq!(report.cached, vec!["/api/commerce/cart/".to_string()]);
        let key = Request::get(&cart).unwrap().key();
        assert!(storage
            .match_entry(&GenerationId::new("shop-v2"), &key)
            .await
            .unwrap()
            .is_some());

        let reads = storage.reads();
        let writes = storage.writes();
        transport.respond(&cart, Response::ok("cart: fresh"));

        let outcome = router.route(Request::get("/api/commerce/cart/").unwrap()).await.unwrap();
        router.wait_until_idle().await;

        assert_eq!(outcome.response.text(), "cart: fresh");
        assert_eq!(outcome.cache_status, CacheStatus::Bypass);
        assert_eq!(transport.calls_for(&cart), 2);
        assert_eq!(storage.reads(), reads);
        assert_eq!(storage.writes(), writes);
    }

    #[tokio::test]
    async fn test_dynamic_api_failure_propagates() {
        let (router, _, transport) = setup();
        transport.fail(&url("/api/feed"), FetchError::Network("offline".into()));

        let err = router.route(Request::get("/api/feed").unwrap()).await.unwrap_err();
        assert!(matches!(err, RouteError::Network { .. }));
    }

    #[tokio::test]
    async fn test_cache_first_second_call_skips_network() {
        let (router, _, transport) = setup();
        let css = url("/css/site.css");
        transport.respond(&css, Response::ok("body { color: red }"));

        let first = router.route(Request::get("/css/site.css").unwrap()).await.unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);

        let second = router.route(Request::get("/css/site.css").unwrap()).await.unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.response.text(), first.response.text());
        assert_eq!(transport.calls_for(&css), 1);
    }

    #[tokio::test]
    async fn test_cache_first_skips_unsuccessful_responses() {
        let (router, storage, transport) = setup();
        let missing = url("/js/missing.js");
        transport.respond(&missing, Response::new(StatusCode::NOT_FOUND, "nope"));

        let outcome = router.route(Request::get("/js/missing.js").unwrap()).await.unwrap();
        assert_eq!(outcome.response.status, StatusCode::NOT_FOUND);
        assert_eq!(storage.writes(), 0);

        router.route(Request::get("/js/missing.js").unwrap()).await.unwrap();
        assert_eq!(transport.calls_for(&missing), 2);
    }

    #[tokio::test]
    async fn test_cache_first_failure_propagates() {
        let (router, _, transport) = setup();
        transport.fail(&url("/js/app.js"), FetchError::Timeout);

        let err = router.route(Request::get("/js/app.js").unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            RouteError::Network {
                source: FetchError::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_install_then_route_served_from_seed() {
        let (router, _, transport) = setup();
        transport.respond(&url("/a"), Response::ok("seed a"));
        transport.respond(&url("/b"), Response::ok("seed b"));

        let report = router.install().await.unwrap();
        assert_eq!(report.cached, vec!["/a".to_string(), "/b".to_string()]);
        assert!(report.is_complete());
        assert!(router.skip_waiting());
        assert_eq!(router.state(), WorkerState::Installed);

        let outcome = router.route(Request::get("/a").unwrap()).await.unwrap();
        assert_eq!(outcome.cache_status, CacheStatus::Hit);
        assert_eq!(outcome.response.text(), "seed a");
        assert_eq!(transport.calls_for(&url("/a")), 1);
    }

    #[tokio::test]
    async fn test_install_isolates_seed_failures() {
        let (router, _, transport) = setup();
        transport.fail(&url("/a"), FetchError::Network("dns".into()));
        transport.respond(&url("/b"), Response::ok("seed b"));
        transport.respond(&url("/c"), Response::new(StatusCode::INTERNAL_SERVER_ERROR, ""));

        let report = router.install_urls(&["/a", "/b", "/c"]).await.unwrap();
        assert_eq!(report.cached, vec!["/b".to_string()]);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(failed, vec!["/a", "/c"]);
        assert_eq!(router.state(), WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_activate_leaves_single_generation() {
        let storage: Arc<dyn CacheStorage> = Arc::new(InMemoryCacheStorage::new());
        let transport = Arc::new(MockTransport::new());
        transport.respond(&url("/a"), Response::ok("v1 a"));
        transport.respond(&url("/b"), Response::ok("v1 b"));

        let old = router_with(RouterConfig::new("shop-v1").with_origin(ORIGIN).with_seed_urls(&["/a", "/b"]), storage.clone(), transport.clone());
        old.install().await.unwrap();
        old.activate().await.unwrap();

        let new = router_with(config(), storage.clone(), transport.clone());
        new.install().await.unwrap();
        let report = new.activate().await.unwrap();

        assert_eq!(report.evicted, vec![GenerationId::new("shop-v1")]);
        assert_eq!(storage.generations().await.unwrap(), vec![GenerationId::new("shop-v2")]);
        assert!(!storage.has(&GenerationId::new("shop-v1")).await.unwrap());
        assert_eq!(new.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let (router, _, _) = setup();
        let err = router.activate().await.unwrap_err();
        assert!(matches!(
            err,
            RouterError::Lifecycle {
                from: WorkerState::Parsed,
                to: WorkerState::Activating,
            }
        ));
    }

    #[tokio::test]
    async fn test_activate_claims_clients() {
        let (router, _, transport) = setup();
        transport.respond(&url("/a"), Response::ok("a"));
        transport.respond(&url("/b"), Response::ok("b"));

        router.register_client(ClientId::new("tab-1"));
        router.register_client(ClientId::new("tab-2"));
        assert_eq!(router.clients().controller_of(&ClientId::new("tab-1")), None);

        router.install().await.unwrap();
        let report = router.activate().await.unwrap();
        assert_eq!(report.claimed_clients, 2);

        router.register_client(ClientId::new("tab-3"));
        assert_eq!(
            router.clients().controller_of(&ClientId::new("tab-3")),
            Some(GenerationId::new("shop-v2"))
        );
    }

    #[tokio::test]
    async fn test_document_falls_back_to_store() {
        let (router, _, transport) = setup();
        let index = url("/index.html");
        transport.respond(&index, Response::ok("<html>fresh</html>"));

        let online = router.route(Request::document("/index.html").unwrap()).await.unwrap();
        assert_eq!(online.strategy, Strategy::NetworkFirst);
        assert_eq!(online.cache_status, CacheStatus::Miss);
        router.wait_until_idle().await;

        transport.fail(&index, FetchError::Network("offline".into()));
        let offline = router.route(Request::document("/index.html").unwrap()).await.unwrap();
        assert_eq!(offline.cache_status, CacheStatus::Fallback);
        assert_eq!(offline.response.text(), "<html>fresh</html>");
    }

    #[tokio::test]
    async fn test_bare_document_name_routes_to_its_own_path() {
        let (router, _, transport) = setup();
        transport.respond(&url("/"), Response::ok("ROOT"));
        transport.respond(&url("/index.html"), Response::ok("<html>index</html>"));

        let outcome = router.route(Request::document("index.html").unwrap()).await.unwrap();
        assert_eq!(outcome.strategy, Strategy::NetworkFirst);
        assert_eq!(outcome.response.text(), "<html>index</html>");
        assert_eq!(transport.calls_for(&url("/")), 0);

        let plain = router.route(Request::get("index.html").unwrap()).await.unwrap();
        assert_eq!(plain.strategy, Strategy::NetworkFirst);
        router.wait_until_idle().await;

        transport.fail(&url("/index.html"), FetchError::Network("offline".into()));
        let offline = router.route(Request::document("index.html").unwrap()).await.unwrap();
        assert_eq!(offline.cache_status, CacheStatus::Fallback);
        assert_eq!(offline.response.text(), "<html>index</html>");
    }

    #[tokio::test]
    async fn test_bare_seed_name_is_cached_under_its_path() {
        let (router, storage, transport) = setup();
        transport.respond(&url("/feed.html"), Response::ok("<html>feed</html>"));
        transport.respond(&url("/app.js?v=3"), Response::ok("console.log(3)"));

        let report = router.install_urls(&["feed.html", "app.js?v=3"]).await.unwrap();
        assert!(report.is_complete());

        let generation = GenerationId::new("shop-v2");
        let feed = Request::get(&url("/feed.html")).unwrap().key();
        assert!(storage.match_entry(&generation, &feed).await.unwrap().is_some());
        let root = Request::get(&url("/")).unwrap().key();
        assert!(storage.match_entry(&generation, &root).await.unwrap().is_none());

        let script = router.route(Request::get("app.js?v=3").unwrap()).await.unwrap();
        assert_eq!(script.cache_status, CacheStatus::Hit);
        assert_eq!(script.response.text(), "console.log(3)");
    }

    #[tokio::test]
    async fn test_document_without_stored_copy_propagates() {
        let (router, _, transport) = setup();
        transport.fail(&url("/index.html"), FetchError::Network("offline".into()));

        let err = router.route(Request::get("/index.html").unwrap()).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_document_refreshes_store() {
        let (router, storage, transport) = setup();
        let index = url("/index.html");

        transport.respond(&index, Response::ok("v1"));
        router.route(Request::document("/index.html").unwrap()).await.unwrap();
        transport.respond(&index, Response::ok("v2"));
        router.route(Request::document("/index.html").unwrap()).await.unwrap();
        router.wait_until_idle().await;

        let key = Request::get(&index).unwrap().key();
        let stored = storage
            .match_entry(&GenerationId::new("shop-v2"), &key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.body, b"v2".to_vec());
    }

    #[tokio::test]
    async fn test_media_uses_no_store_and_propagates_failure() {
        let (router, storage, transport) = setup();
        let photo = url("/avatars/photo.jpg");

        transport.respond(&photo, Response::ok(vec![0xFF, 0xD8]));
        let outcome = router.route(Request::get("/avatars/photo.jpg").unwrap()).await.unwrap();
        assert_eq!(outcome.strategy, Strategy::NetworkNoStore);
        assert_eq!(transport.last_options(&photo).map(|o| o.cache), Some(CacheMode::NoStore));

        transport.fail(&photo, FetchError::Network("CORS rejected".into()));
        let err = router.route(Request::get("/avatars/photo.jpg").unwrap()).await.unwrap_err();
        assert!(matches!(err, RouteError::Network { .. }));

        router.wait_until_idle().await;
        assert_eq!(storage.reads(), 0);
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn test_opaque_host_failure_surfaces_as_opaque() {
        let (router, storage, transport) = setup();
        let clip = "https://pub-9f2.r2.dev/videos/clip.mp4";
        transport.fail(clip, FetchError::Network("CORS".into()));

        let err = router.route(Request::get(clip).unwrap()).await.unwrap_err();
        assert!(matches!(err, RouteError::OpaqueResponse { .. }));
        assert_eq!(storage.reads(), 0);
    }

    #[tokio::test]
    async fn test_observer_sees_events() {
        let storage = Arc::new(CountingStorage::new());
        let transport = Arc::new(MockTransport::new());
        let observer = Arc::new(RecordingObserver::default());
        let router = router_with(config(), storage, transport.clone()).with_observer(observer.clone());

        transport.respond(&url("/a"), Response::ok("a"));
        router.install_urls(&["/a", "/missing"]).await.unwrap();
        router.route(Request::get("/a").unwrap()).await.unwrap();

        let names = observer.names();
        assert_eq!(names.first().map(String::as_str), Some("installing"));
        assert!(names.contains(&"seed_cached".to_string()));
        assert!(names.contains(&"seed_failed".to_string()));
        assert!(names.contains(&"installed".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("routed"));
    }

    #[tokio::test]
    async fn test_classify_resolves_relative_urls() {
        let (router, _, _) = setup();
        let rule = router.classify(&Request::get("/avatars/me.png").unwrap());
        assert_eq!(rule.strategy, Strategy::NetworkNoStore);
        assert_eq!(rule.name(), "media");
    }
}
