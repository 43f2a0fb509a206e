//! Cache key derivation.
//!
//! The base key is the full request URL including the query string. When a
//! response carries a non-empty `Vary` field list, the key additionally
//! carries a variant fingerprint: a SHA-256 digest over the sorted varying
//! field names together with the originating request's values for those
//! fields, so distinct Vary-selected variants have distinct identities.
//!
//! The store keeps exactly one entry per base key (the `slot`): a later
//! cacheable response for the same URL overwrites the previous entry even
//! when its variant fingerprint differs. Reuse is re-validated per request
//! by the Vary comparator in `cache::policy` against whichever request
//! headers were last stored.

use sha2::{Digest, Sha256};

use super::headers::ParsedHeaders;

/// Lookup/storage key for a cached response.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    /// Full request URL including the query string
    base: String,
    /// Hex SHA-256 fingerprint of the Vary selector, when the response varies
    variant: Option<String>,
}

impl CacheKey {
    /// Derive the lookup key for an incoming request.
    ///
    /// The Vary field list of a matching response is unknown before the
    /// lookup, so the request key is always the bare base key.
    pub fn for_request(url: &str) -> Self {
        Self {
            base: url.to_string(),
            variant: None,
        }
    }

    /// Derive the storage key for a response about to be cached.
    ///
    /// Incorporates the variant fingerprint when the response lists
    /// non-wildcard `Vary` fields. A wildcard never reaches storage
    /// (cacheability rejects it), but is treated as "no variant" here so
    /// the derivation stays total.
    pub fn for_stored(url: &str, response: &ParsedHeaders, request: &ParsedHeaders) -> Self {
        let mut fields = response.vary_fields();
        if fields.is_empty() || fields.iter().any(|field| field == "*") {
            return Self::for_request(url);
        }
        fields.sort();
        fields.dedup();

        let mut hasher = Sha256::new();
        for field in &fields {
            hasher.update(field.as_bytes());
            hasher.update(b"=");
            if let Some(values) = request.value(field) {
                let mut values = values.to_vec();
                values.sort();
                hasher.update(values.join(",").as_bytes());
            } else {
                // Distinguish "field absent" from "field present but empty"
                hasher.update(b"\x00absent");
            }
            hasher.update(b"\n");
        }

        Self {
            base: url.to_string(),
            variant: Some(hex::encode(hasher.finalize())),
        }
    }

    /// Store slot this key maps to: the base URL. One entry per slot,
    /// last writer wins across variants.
    pub fn slot(&self) -> &str {
        &self.base
    }

    /// Variant fingerprint, when the stored response varies.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}#{}", self.base, variant),
            None => write!(f, "{}", self.base),
        }
    }
}
