//! Request Interceptor
//!
//! Applies the selected caching strategy to every outbound request.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::fallback;
use crate::cache::{CacheEntry, CacheStore, CacheVersion, PartitionRole, RequestKey};
use crate::fetch::{Connectivity, FetchRequest, FetchResponse, Network, NetworkError};
use crate::strategy::{RequestClass, Route, Strategy, StrategySelector};

/// Result of fetching the precache list into a staged version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    pub stored: Vec<String>,
    pub failed: Vec<String>,
}

// == Interceptor ==
/// Single entry point between application code and the network.
pub struct Interceptor {
    cache: Arc<RwLock<CacheStore>>,
    network: Arc<dyn Network>,
    selector: StrategySelector,
    connectivity: Connectivity,
    /// URL of the page served to offline navigations
    offline_page: String,
}

impl Interceptor {
    pub fn new(
        cache: Arc<RwLock<CacheStore>>,
        network: Arc<dyn Network>,
        selector: StrategySelector,
        connectivity: Connectivity,
        offline_page: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            network,
            selector,
            connectivity,
            offline_page: offline_page.into(),
        }
    }

    // == Handle ==
    /// Answers a request according to its route.
    ///
    /// GET requests always produce a response, synthesized when offline.
    /// Non-GET requests bypass the cache and return the raw network error.
    pub async fn handle(&self, request: &FetchRequest) -> Result<FetchResponse, NetworkError> {
        if !request.is_get() {
            return self.fetch_network(request).await;
        }

        let route = self.selector.classify(&request.method, &request.path());
        debug!("{} {} -> {} ({})", request.method, request.url, route.strategy, route.rule);

        let response = match route.strategy {
            Strategy::CacheFirst => self.cache_first(request, route).await,
            Strategy::NetworkFirst => self.network_first(request, route).await,
        };
        Ok(response)
    }

    async fn cache_first(&self, request: &FetchRequest, route: Route) -> FetchResponse {
        if let Some(entry) = self.lookup(route.partition, request).await {
            return entry.to_response();
        }

        match self.fetch_network(request).await {
            Ok(response) => {
                self.write_through(route.partition, request, &response).await;
                response
            }
            Err(err) => {
                warn!("{} unavailable and not cached: {}", request.url, err);
                self.cache.write().await.record_offline_fallback();
                match route.class {
                    RequestClass::Image => fallback::image_placeholder(),
                    _ => fallback::service_unavailable(),
                }
            }
        }
    }

    async fn network_first(&self, request: &FetchRequest, route: Route) -> FetchResponse {
        let err = match self.fetch_network(request).await {
            Ok(response) => {
                self.write_through(route.partition, request, &response).await;
                return response;
            }
            Err(err) => err,
        };

        warn!("{} failed ({}), trying cache", request.url, err);
        if let Some(entry) = self.lookup(route.partition, request).await {
            return entry.to_response();
        }
        // Precached shell assets live in the static partition.
        if route.partition != PartitionRole::Static {
            if let Some(entry) = self.lookup(PartitionRole::Static, request).await {
                return entry.to_response();
            }
        }
        self.offline_response(request, route).await
    }

    async fn fetch_network(&self, request: &FetchRequest) -> Result<FetchResponse, NetworkError> {
        let result = self.network.fetch(request).await;
        match &result {
            Ok(_) => self.connectivity.report_online(),
            Err(_) => self.connectivity.report_offline(),
        }
        result
    }

    async fn lookup(&self, role: PartitionRole, request: &FetchRequest) -> Option<CacheEntry> {
        let key = RequestKey::for_request(request);
        // Write lock: lookups update recency and stats.
        let mut cache = self.cache.write().await;
        match cache.get(role, &key) {
            Ok(entry) => entry,
            Err(err) => {
                error!("Cache read for {} failed, continuing without cache: {}", key, err);
                None
            }
        }
    }

    async fn write_through(&self, role: PartitionRole, request: &FetchRequest, response: &FetchResponse) {
        let mut cache = self.cache.write().await;
        if let Err(err) = cache.put(role, request, response) {
            warn!("Cache write for {} skipped: {}", request.url, err);
        }
    }

    /// Network-first miss while offline.
    async fn offline_response(&self, request: &FetchRequest, route: Route) -> FetchResponse {
        self.cache.write().await.record_offline_fallback();

        match route.class {
            RequestClass::Image => fallback::image_placeholder(),
            RequestClass::Api => fallback::offline_api(),
            _ if request.is_navigation() => self.offline_page().await,
            _ => fallback::service_unavailable(),
        }
    }

    async fn offline_page(&self) -> FetchResponse {
        let page = FetchRequest::get(self.offline_page.clone());
        match self.lookup(PartitionRole::Static, &page).await {
            Some(entry) => entry.to_response(),
            None => fallback::builtin_offline_page(),
        }
    }

    // == Precache ==
    /// Fetches `urls` into the static partition of a staged `version`.
    ///
    /// The version must already be staged. Individual failures are recorded
    /// and skipped.
    pub async fn precache(&self, version: &CacheVersion, urls: &[String]) -> PrecacheReport {
        let mut report = PrecacheReport::default();

        for url in urls {
            let request = FetchRequest::get(url.clone());
            let stored = match self.fetch_network(&request).await {
                Ok(response) => {
                    let mut cache = self.cache.write().await;
                    cache
                        .put_staged(PartitionRole::Static, version, &request, &response)
                        .unwrap_or_else(|err| {
                            warn!("Precache of {} rejected: {}", url, err);
                            false
                        })
                }
                Err(err) => {
                    warn!("Precache of {} failed: {}", url, err);
                    false
                }
            };

            if stored {
                report.stored.push(url.clone());
            } else {
                report.failed.push(url.clone());
            }
        }

        info!(
            "Precached {} of {} URLs into version {}",
            report.stored.len(),
            urls.len(),
            version
        );
        report
    }

    pub fn cache(&self) -> &Arc<RwLock<CacheStore>> {
        &self.cache
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{LinkState, ResponseSource};
    use crate::test_support::ScriptedNetwork;
    use axum::http::{header, HeaderValue, Method, StatusCode};

    struct Fixture {
        network: Arc<ScriptedNetwork>,
        interceptor: Interceptor,
    }

    fn fixture(network: ScriptedNetwork) -> Fixture {
        let network = Arc::new(network);
        let cache = CacheStore::new(CacheVersion::new("v1").unwrap(), 100, 1024 * 1024);
        let interceptor = Interceptor::new(
            Arc::new(RwLock::new(cache)),
            network.clone(),
            StrategySelector::default(),
            Connectivity::new(),
            "/offline.html",
        );
        Fixture {
            network,
            interceptor,
        }
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let f = fixture(ScriptedNetwork::online());
        f.network.respond(Method::GET, "/images/logo.png", StatusCode::OK, "png-bytes");
        let request = FetchRequest::get("/images/logo.png");

        let first = f.interceptor.handle(&request).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(f.network.call_count(), 1);

        let second = f.interceptor.handle(&request).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.body, first.body);
        assert_eq!(f.network.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_offline_image_gets_placeholder() {
        let f = fixture(ScriptedNetwork::offline());

        let response = f
            .interceptor
            .handle(&FetchRequest::get("/storage/photos/3.jpg"))
            .await
            .unwrap();

        assert_eq!(response.source, ResponseSource::Fallback);
        assert_eq!(response.headers.get(header::CONTENT_TYPE).unwrap(), "image/svg+xml");
    }

    #[tokio::test]
    async fn test_cache_first_offline_static_gets_503() {
        let f = fixture(ScriptedNetwork::offline());

        let response = f
            .interceptor
            .handle(&FetchRequest::get("/build/app.js"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cache_first_offline_html_accept_still_gets_503() {
        let f = fixture(ScriptedNetwork::offline());
        let request = FetchRequest::get("/build/app.js")
            .with_header(header::ACCEPT, HeaderValue::from_static("text/html"));

        let response = f.interceptor.handle(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn test_network_first_refreshes_cache() {
        let f = fixture(ScriptedNetwork::online());
        let request = FetchRequest::get("/api/zones");

        f.network.respond(Method::GET, "/api/zones", StatusCode::OK, "[1]");
        f.interceptor.handle(&request).await.unwrap();
        f.network.respond(Method::GET, "/api/zones", StatusCode::OK, "[1,2]");
        let fresh = f.interceptor.handle(&request).await.unwrap();
        assert_eq!(&fresh.body[..], b"[1,2]");

        f.network.set_online(false);
        let cached = f.interceptor.handle(&request).await.unwrap();
        assert_eq!(cached.source, ResponseSource::Cache);
        assert_eq!(&cached.body[..], b"[1,2]");
    }

    #[tokio::test]
    async fn test_network_first_does_not_cache_errors() {
        let f = fixture(ScriptedNetwork::online());
        f.network.respond(Method::GET, "/api/zones", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let request = FetchRequest::get("/api/zones");

        let response = f.interceptor.handle(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

        f.network.set_online(false);
        let offline = f.interceptor.handle(&request).await.unwrap();
        assert_eq!(offline.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(offline.json_body().unwrap()["error"], "Offline");
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_builtin_page() {
        let f = fixture(ScriptedNetwork::offline());
        let request = FetchRequest::get("/driver/route")
            .with_header(header::ACCEPT, HeaderValue::from_static("text/html"));

        let response = f.interceptor.handle(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_offline_navigation_prefers_precached_page() {
        let f = fixture(ScriptedNetwork::online());
        f.network.respond(Method::GET, "/offline.html", StatusCode::OK, "<h1>offline</h1>");
        let v1 = CacheVersion::new("v1").unwrap();
        f.interceptor.precache(&v1, &["/offline.html".to_string()]).await;

        f.network.set_online(false);
        let request = FetchRequest::get("/driver/route")
            .with_header(header::ACCEPT, HeaderValue::from_static("text/html"));
        let response = f.interceptor.handle(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"<h1>offline</h1>");
    }

    #[tokio::test]
    async fn test_offline_non_navigation_default_gets_503() {
        let f = fixture(ScriptedNetwork::offline());

        let response = f.interceptor.handle(&FetchRequest::get("/reports.csv")).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(&response.body[..], b"Service Unavailable");
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache_and_surfaces_error() {
        let f = fixture(ScriptedNetwork::online());
        let post = FetchRequest::new(Method::POST, "/api/zones").with_body("{}");

        f.interceptor.handle(&post).await.unwrap();
        assert_eq!(f.interceptor.cache().read().await.len(PartitionRole::Api), 0);

        f.network.set_online(false);
        let result = f.interceptor.handle(&post).await;
        assert!(matches!(result, Err(NetworkError::Unreachable(_))));

        let stats = f.interceptor.cache().read().await.stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_oversized_response_still_returned() {
        let network = Arc::new(ScriptedNetwork::online());
        network.respond(Method::GET, "/api/export", StatusCode::OK, vec![7u8; 64]);
        let cache = CacheStore::new(CacheVersion::new("v1").unwrap(), 10, 16);
        let interceptor = Interceptor::new(
            Arc::new(RwLock::new(cache)),
            network.clone(),
            StrategySelector::default(),
            Connectivity::new(),
            "/offline.html",
        );

        let response = interceptor.handle(&FetchRequest::get("/api/export")).await.unwrap();

        assert_eq!(response.body.len(), 64);
        assert_eq!(interceptor.cache().read().await.len(PartitionRole::Api), 0);
    }

    #[tokio::test]
    async fn test_reports_connectivity() {
        let f = fixture(ScriptedNetwork::offline());
        f.interceptor.handle(&FetchRequest::get("/api/zones")).await.unwrap();
        assert_eq!(f.interceptor.connectivity().state(), LinkState::Offline);

        f.network.set_online(true);
        f.interceptor.handle(&FetchRequest::get("/api/zones")).await.unwrap();
        assert_eq!(f.interceptor.connectivity().state(), LinkState::Online);
    }

    #[tokio::test]
    async fn test_precache_reports_failures() {
        let f = fixture(ScriptedNetwork::online());
        f.network.respond(Method::GET, "/missing.css", StatusCode::NOT_FOUND, "");
        let v2 = CacheVersion::new("v2").unwrap();
        f.interceptor.cache().write().await.stage(&v2);

        let report = f
            .interceptor
            .precache(&v2, &["/".to_string(), "/missing.css".to_string()])
            .await;

        assert_eq!(report.stored, vec!["/".to_string()]);
        assert_eq!(report.failed, vec!["/missing.css".to_string()]);
    }
}
