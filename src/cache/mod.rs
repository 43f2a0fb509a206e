//! HTTP cache-semantics engine (RFC 9111 subset).
//!
//! Modules, leaves first:
//! - `headers`: normalized directive/value view over a header collection
//! - `freshness`: freshness lifetime and current-age computation
//! - `policy`: store-eligibility, reuse-eligibility, Vary matching
//! - `key`: cache key derivation with Vary variant fingerprints
//! - `entry`: the immutable cached response capture
//! - `store`: the concurrent entry repository
//!
//! Everything except the store is a pure function of its inputs and is
//! safely callable from any number of concurrent tasks.

pub mod entry;
pub mod freshness;
pub mod headers;
pub mod key;
pub mod policy;
pub mod store;

pub use entry::CachedResponse;
pub use headers::ParsedHeaders;
pub use key::CacheKey;
pub use store::{CacheStats, CacheStore};
