//! Outbound transport layer.
//!
//! `Transport` is the origin collaborator contract: one round trip from a
//! buffered request to a buffered response, or an error. The engine treats
//! it as a black box and never retries it.
//!
//! `HttpTransport` performs real round trips over the hyper legacy client.
//! `CachingTransport` decorates any `Transport` with the cache engine:
//! non-GET requests pass through unmodified, GET requests are answered
//! from the store when a fresh, reuse-eligible entry exists, and
//! store-eligible origin responses are captured on the way back.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{policy, CacheKey, CacheStore, CachedResponse, ParsedHeaders};

/// Transport-layer failures. Header parsing never surfaces here; only
/// origin communication and body buffering can fail.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The origin could not be reached or the exchange failed
    #[error("origin fetch failed: {0}")]
    Origin(String),

    /// The response body could not be read while buffering
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// One HTTP round trip against the origin.
///
/// Implementations must not retry; cancellation and deadlines are
/// whatever the caller's context imposes on the returned future.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError>;
}

// Shared transports (Arc<HttpTransport>, Arc<dyn Transport>) round-trip
// through the same contract as owned ones.
#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        (**self).round_trip(req).await
    }
}

/// Real origin transport over the hyper legacy client.
///
/// Response bodies are collected into memory before returning, since the
/// cache engine needs the full body for storage decisions anyway.
pub struct HttpTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        let (parts, body) = req.into_parts();
        let req = Request::from_parts(parts, Full::new(body));

        let response = self
            .client
            .request(req)
            .await
            .map_err(|err| TransportError::Origin(err.to_string()))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|err| TransportError::Body(err.to_string()))?
            .to_bytes();

        Ok(Response::from_parts(parts, body))
    }
}

/// Caching decorator around an inner transport.
///
/// GET requests go through the full decision path: key derivation, store
/// lookup, freshness plus reuse-eligibility, and store-eligibility of the
/// fetched response. Every other method is handed to the inner transport
/// untouched. Fetch errors propagate to the caller and nothing is stored.
pub struct CachingTransport<T> {
    inner: T,
    store: Arc<CacheStore>,
}

impl<T: Transport> CachingTransport<T> {
    /// Decorate a transport with a fresh, private store.
    pub fn new(inner: T) -> Self {
        Self::with_store(inner, Arc::new(CacheStore::new()))
    }

    /// Decorate a transport with a shared store.
    pub fn with_store(inner: T, store: Arc<CacheStore>) -> Self {
        Self { inner, store }
    }

    /// Handle to the underlying store.
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        if req.method() != Method::GET {
            return self.inner.round_trip(req).await;
        }

        let url = req.uri().to_string();
        let request_parsed = ParsedHeaders::parse(req.headers());
        let lookup = CacheKey::for_request(&url);

        if let Some(entry) = self.store.get(lookup.slot()) {
            if policy::is_servable(&entry, &request_parsed) {
                tracing::debug!(cache_key = %entry.key, "serving response from cache");
                return Ok(entry.to_response());
            }
        }

        let method = req.method().clone();
        let request_header = req.headers().clone();
        let response = self.inner.round_trip(req).await?;

        let response_parsed = ParsedHeaders::parse(response.headers());
        if policy::is_cacheable(&method, &response_parsed) {
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

        Ok(response)
    }
}
