//! Reverse-proxy handler.
//!
//! `CacheProxy` serves inbound requests against a single origin using the
//! cache engine: GET requests are answered from the store when a fresh,
//! reuse-eligible entry exists, every other method is proxied straight
//! through, and store-eligible origin responses are captured on the way
//! back to the client.
//!
//! A named-path registry lets auxiliary handlers short-circuit the cache
//! path entirely for exact URL paths; `/statusz` is registered by default
//! and reports uptime plus store counters as JSON.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, HOST};
use http::{Method, Request, Response, Uri};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{policy, CacheKey, CacheStore, CachedResponse, ParsedHeaders};
use crate::error::ProxyError;
use crate::transport::Transport;

/// Handler for an auxiliary path, bypassing all cache logic.
pub type PathHandler = Arc<dyn Fn(&Request<Bytes>) -> Response<Bytes> + Send + Sync>;

/// Reverse-proxy cache over a single origin.
pub struct CacheProxy {
    store: Arc<CacheStore>,
    transport: Arc<dyn Transport>,
    origin: Uri,
    path_handlers: HashMap<String, PathHandler>,
    start_time: Instant,
}

impl CacheProxy {
    /// Create a proxy for one origin, registering the default `/statusz`
    /// endpoint.
    pub fn new(origin: Uri, transport: Arc<dyn Transport>, store: Arc<CacheStore>) -> Self {
        let mut proxy = Self {
            store,
            transport,
            origin,
            path_handlers: HashMap::new(),
            start_time: Instant::now(),
        };

        let store = proxy.store.clone();
        let started = proxy.start_time;
        proxy.register_path(
            "/statusz",
            Arc::new(move |_req| status_response(&store, started)),
        );
        proxy
    }

    /// Register a handler for an exact URL path. Requests matching the
    /// path never touch the cache or the origin.
    pub fn register_path(&mut self, path: impl Into<String>, handler: PathHandler) {
        self.path_handlers.insert(path.into(), handler);
    }

    /// Handle to the underlying store.
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Serve one inbound request. Always produces a response; origin
    /// failures surface as gateway-class error responses.
    pub async fn handle(&self, req: Request<Bytes>) -> Response<Bytes> {
        if let Some(handler) = self.path_handlers.get(req.uri().path()) {
            return handler(&req);
        }

        if req.method() != Method::GET {
            return self.proxy_to_origin(req).await;
        }

        if let Some(response) = self.serve_from_cache(&req) {
            return response;
        }

        self.fetch_and_cache(req).await
    }

    /// Answer a GET from the store when the entry is fresh and the request
    /// is allowed to reuse it.
    fn serve_from_cache(&self, req: &Request<Bytes>) -> Option<Response<Bytes>> {
        let lookup = CacheKey::for_request(&req.uri().to_string());
        let entry = self.store.get(lookup.slot())?;

        let request_parsed = ParsedHeaders::parse(req.headers());
        if !policy::is_servable(&entry, &request_parsed) {
            return None;
        }

        tracing::debug!(cache_key = %entry.key, "serving response from cache");
        Some(entry.to_response())
    }

    /// Fetch a GET from the origin, store it when eligible, and serve it.
    async fn fetch_and_cache(&self, req: Request<Bytes>) -> Response<Bytes> {
        let url = req.uri().to_string();
        let request_parsed = ParsedHeaders::parse(req.headers());
        let request_header = req.headers().clone();

        let origin_req = match self.build_origin_request(req) {
            Ok(origin_req) => origin_req,
            Err(err) => return error_response(&err),
        };

        let response = match self.transport.round_trip(origin_req).await {
            Ok(response) => response,
            Err(err) => {
                let err = ProxyError::from(err);
                tracing::warn!(url = %url, error = %err, "origin fetch failed");
                return error_response(&err);
            }
        };

        let response_parsed = ParsedHeaders::parse(response.headers());
        if policy::is_cacheable(&Method::GET, &response_parsed) {
            let key = CacheKey::for_stored(&url, &response_parsed, &request_parsed);
            let entry = CachedResponse::new(
                key,
                response.status(),
                request_header,
                response.headers().clone(),
                response.body().clone(),
                response_parsed.validated_age(),
            );
            tracing::debug!(cache_key = %entry.key, size_bytes = entry.size_bytes(), "stored response");
            self.store.set(entry);
        }

        response
    }

    /// Proxy a non-GET request straight through to the origin.
    async fn proxy_to_origin(&self, req: Request<Bytes>) -> Response<Bytes> {
        let url = req.uri().to_string();

        let origin_req = match self.build_origin_request(req) {
            Ok(origin_req) => origin_req,
            Err(err) => return error_response(&err),
        };

        match self.transport.round_trip(origin_req).await {
            Ok(response) => response,
            Err(err) => {
                let err = ProxyError::from(err);
                tracing::warn!(url = %url, error = %err, "origin fetch failed");
                error_response(&err)
            }
        }
    }

    /// Rewrite an inbound request to target the origin, keeping the path
    /// and query. The stale inbound `Host` header is dropped so the client
    /// derives it from the rewritten URI.
    fn build_origin_request(&self, req: Request<Bytes>) -> Result<Request<Bytes>, ProxyError> {
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        let scheme = self
            .origin
            .scheme()
            .cloned()
            .ok_or_else(|| ProxyError::Internal("origin url is missing a scheme".to_string()))?;
        let authority = self
            .origin
            .authority()
            .cloned()
            .ok_or_else(|| ProxyError::Internal("origin url is missing an authority".to_string()))?;
        let uri = Uri::builder()
            .scheme(scheme)
            .authority(authority)
            .path_and_query(path_and_query)
            .build()
            .map_err(|err| ProxyError::Internal(err.to_string()))?;

        let (mut parts, body) = req.into_parts();
        parts.uri = uri;
        parts.headers.remove(HOST);
        Ok(Request::from_parts(parts, body))
    }
}

/// Build the `/statusz` JSON response from the store counters.
fn status_response(store: &CacheStore, started: Instant) -> Response<Bytes> {
    let body = serde_json::json!({
        "status": "ok",
        "uptime_seconds": started.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "cache": store.stats(),
    })
    .to_string();

    let mut response = Response::new(Bytes::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Build a plain-text error response for a proxy failure.
fn error_response(err: &ProxyError) -> Response<Bytes> {
    let message = match err {
        ProxyError::Origin(_) => "Origin fetch failed",
        ProxyError::Body(_) => "Failed to read response body",
        ProxyError::Config(_) | ProxyError::Internal(_) => "Internal proxy error",
    };

    let mut response = Response::new(Bytes::from_static(message.as_bytes()));
    *response.status_mut() = err.status_code();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
