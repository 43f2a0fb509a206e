//! Cache entry type.
//!
//! A `CachedResponse` is one complete, immutable capture of an origin
//! exchange: the response status/headers/body plus a snapshot of the
//! request headers that produced it (needed later for Vary comparison)
//! and the age bookkeeping taken at capture time.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::time::SystemTime;

use super::key::CacheKey;

/// One cache entry.
///
/// Created atomically when a cacheable response is received and replaced
/// wholesale by a later store under the same slot. Callers receive shared
/// references from the store and must never mutate an entry in place;
/// serving paths clone the headers they hand out.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Derived key this entry was stored under (includes the Vary variant
    /// fingerprint when the response varies)
    pub key: CacheKey,
    /// Origin response status
    pub status: StatusCode,
    /// Snapshot of the request headers that produced this entry
    pub request_header: HeaderMap,
    /// Snapshot of the origin response headers
    pub response_header: HeaderMap,
    /// Buffered response body
    pub body: Bytes,
    /// Capture timestamp
    pub stored_at: SystemTime,
    /// Seconds taken from the origin's `Age` header at capture time
    /// (0 if absent or invalid)
    pub initial_age: u64,
}

impl CachedResponse {
    /// Create an entry captured now.
    pub fn new(
        key: CacheKey,
        status: StatusCode,
        request_header: HeaderMap,
        response_header: HeaderMap,
        body: Bytes,
        initial_age: u64,
    ) -> Self {
        Self {
            key,
            status,
            request_header,
            response_header,
            body,
            stored_at: SystemTime::now(),
            initial_age,
        }
    }

    /// Synthesize an HTTP response from this entry.
    ///
    /// Clones the stored response headers and rewrites `Age` to the
    /// recomputed current age; the stored entry itself is untouched.
    pub fn to_response(&self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body.clone());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_header.clone();
        response
            .headers_mut()
            .insert(http::header::AGE, super::freshness::current_age(self).into());
        response
    }

    /// Approximate in-memory size of this entry in bytes.
    pub fn size_bytes(&self) -> usize {
        let header_bytes = |headers: &HeaderMap| -> usize {
            headers
                .iter()
                .map(|(name, value)| name.as_str().len() + value.len())
                .sum()
        };
        self.body.len() + header_bytes(&self.request_header) + header_bytes(&self.response_header)
    }
}
