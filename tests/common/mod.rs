//! Shared test fixtures: an in-process fake origin implementing the
//! `Transport` contract, with programmable routes and a fetch counter.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use suzaku::transport::{Transport, TransportError};

pub struct FakeOrigin {
    routes: HashMap<String, (Vec<(String, String)>, Bytes)>,
    fetches: AtomicUsize,
}

impl FakeOrigin {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Register a 200 response for a path.
    pub fn route(mut self, path: &str, headers: &[(&str, &str)], body: &'static [u8]) -> Self {
        self.routes.insert(
            path.to_string(),
            (
                headers
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                Bytes::from_static(body),
            ),
        );
        self
    }

    /// Number of round trips that reached this origin.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeOrigin {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let Some((headers, body)) = self.routes.get(req.uri().path()) else {
            return Err(TransportError::Origin(format!(
                "no route for {}",
                req.uri().path()
            )));
        };

        let mut response = Response::new(body.clone());
        *response.status_mut() = StatusCode::OK;
        for (name, value) in headers {
            response.headers_mut().append(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        Ok(response)
    }
}

pub fn get(path: &str, headers: &[(&str, &str)]) -> Request<Bytes> {
    request(Method::GET, path, headers)
}

pub fn request(method: Method, path: &str, headers: &[(&str, &str)]) -> Request<Bytes> {
    let mut req = Request::new(Bytes::new());
    *req.method_mut() = method;
    *req.uri_mut() = path.parse().unwrap();
    for (name, value) in headers {
        req.headers_mut().append(
            name.parse::<HeaderName>().unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    req
}

/// Rewind a stored entry's capture time, simulating the passage of time
/// without sleeping.
pub fn age_entry(store: &suzaku::cache::CacheStore, slot: &str, seconds: u64) {
    let entry = store.get(slot).expect("entry to age must exist");
    let mut aged = (*entry).clone();
    aged.stored_at = std::time::SystemTime::now() - std::time::Duration::from_secs(seconds);
    store.set(aged);
}
