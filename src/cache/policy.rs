//! Cacheability and reuse policy.
//!
//! Two decisions live here, per RFC 9111 with documented simplifications:
//! - store-eligibility: may this origin response be stored at all
//! - reuse-eligibility: may this stored entry answer a new request,
//!   covering the Authorization gate and Vary secondary-key matching
//!
//! Simplification: `no-cache` is treated as "never store" rather than
//! "store but revalidate before reuse" (RFC 9111 §5.2.2.4 would permit
//! storage). `CDN-Cache-Control` gets the same no-cache/no-store/private
//! screen, checked independently of `Cache-Control`.

use http::Method;

use super::entry::CachedResponse;
use super::freshness;
use super::headers::ParsedHeaders;

/// Directives that disqualify a response from storage when present on
/// either `Cache-Control` or `CDN-Cache-Control`.
const DISQUALIFYING_DIRECTIVES: [&str; 3] = ["no-cache", "no-store", "private"];

/// Store-eligibility of an origin response.
///
/// Only GET responses qualify. A disqualifying directive on either
/// `Cache-Control` or `CDN-Cache-Control`, or a `Vary: *`, rejects the
/// response outright.
pub fn is_cacheable(method: &Method, headers: &ParsedHeaders) -> bool {
    if method != Method::GET {
        return false;
    }

    for header in ["cache-control", "cdn-cache-control"] {
        for directive in DISQUALIFYING_DIRECTIVES {
            if headers.directive(header, directive).is_some() {
                return false;
            }
        }
    }

    !headers.is_vary_wildcard()
}

/// Vary secondary-key matching (RFC 9111 §4.1).
///
/// For each field the response lists in `Vary`, the current request and
/// the originating request must agree: both missing the field is a match,
/// exactly one having it is a mismatch, and when both have it the value
/// lists must be equal as multisets (order-independent).
pub fn headers_meet_vary_constraints(
    current: &ParsedHeaders,
    original: &ParsedHeaders,
    response: &ParsedHeaders,
) -> bool {
    let fields = response.vary_fields();
    if fields.is_empty() {
        return true;
    }
    // A Vary: * response is never reusable. Store-time checks should have
    // rejected it already; repeated here for entries that predate them.
    if response.is_vary_wildcard() {
        return false;
    }

    for field in &fields {
        match (current.value(field), original.value(field)) {
            (None, None) => continue,
            (Some(current_values), Some(original_values)) => {
                if current_values.len() != original_values.len() {
                    return false;
                }
                let mut current_values = current_values.to_vec();
                let mut original_values = original_values.to_vec();
                current_values.sort();
                original_values.sort();
                if current_values != original_values {
                    return false;
                }
            }
            _ => return false,
        }
    }

    true
}

/// Reuse-eligibility of a stored response for a new request.
///
/// A request carrying `Authorization` may only be answered from cache when
/// the stored response's `Cache-Control` carries `public`,
/// `must-revalidate`, or `s-maxage` (RFC 9111 §3.5). The Vary constraints
/// must hold as well.
pub fn is_request_allowed_to_use_cache(
    request: &ParsedHeaders,
    original_request: &ParsedHeaders,
    response: &ParsedHeaders,
) -> bool {
    if request.directives("authorization").is_some() {
        let permitted = ["public", "must-revalidate", "s-maxage"]
            .iter()
            .any(|directive| response.directive("cache-control", directive).is_some());
        if !permitted {
            return false;
        }
    }

    headers_meet_vary_constraints(request, original_request, response)
}

/// Whether a stored entry may answer this request: fresh and reuse-allowed.
pub fn is_servable(entry: &CachedResponse, request: &ParsedHeaders) -> bool {
    if !freshness::is_fresh(entry) {
        return false;
    }
    let original_request = ParsedHeaders::parse(&entry.request_header);
    let response = ParsedHeaders::parse(&entry.response_header);
    is_request_allowed_to_use_cache(request, &original_request, &response)
}

#[cfg(test)]
mod tests {
    use super::super::key::CacheKey;
    use super::*;
    use bytes::Bytes;
    use http::header::{HeaderName, HeaderValue};
    use http::{HeaderMap, StatusCode};
    use rstest::rstest;
    use std::time::SystemTime;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn parsed(pairs: &[(&str, &str)]) -> ParsedHeaders {
        ParsedHeaders::parse(&header_map(pairs))
    }

    #[rstest]
    #[case::post(Method::POST)]
    #[case::put(Method::PUT)]
    #[case::delete(Method::DELETE)]
    #[case::head(Method::HEAD)]
    #[case::options(Method::OPTIONS)]
    fn test_non_get_is_never_cacheable(#[case] method: Method) {
        let headers = parsed(&[("Cache-Control", "public, max-age=3600")]);
        assert!(!is_cacheable(&method, &headers));
    }

    #[test]
    fn test_get_without_disqualifiers_is_cacheable() {
        assert!(is_cacheable(&Method::GET, &parsed(&[])));
        assert!(is_cacheable(
            &Method::GET,
            &parsed(&[("Cache-Control", "max-age=60")])
        ));
    }

    #[rstest]
    #[case::no_cache("no-cache")]
    #[case::no_store("no-store")]
    #[case::private("private")]
    fn test_cache_control_directive_rejects_storage(#[case] directive: &str) {
        let headers = parsed(&[("Cache-Control", directive)]);
        assert!(!is_cacheable(&Method::GET, &headers));
    }

    #[rstest]
    #[case::no_cache("no-cache")]
    #[case::no_store("no-store")]
    #[case::private("private")]
    fn test_cdn_cache_control_rejects_independently(#[case] directive: &str) {
        // Cache-Control itself is permissive; the CDN-scoped override wins
        let headers = parsed(&[
            ("Cache-Control", "public, max-age=3600"),
            ("CDN-Cache-Control", directive),
        ]);
        assert!(!is_cacheable(&Method::GET, &headers));
    }

    #[test]
    fn test_vary_wildcard_rejects_storage() {
        let headers = parsed(&[("Vary", "*")]);
        assert!(!is_cacheable(&Method::GET, &headers));
    }

    #[test]
    fn test_vary_absent_always_matches() {
        assert!(headers_meet_vary_constraints(
            &parsed(&[("Accept-Language", "en")]),
            &parsed(&[]),
            &parsed(&[]),
        ));
    }

    #[test]
    fn test_vary_wildcard_never_matches() {
        assert!(!headers_meet_vary_constraints(
            &parsed(&[]),
            &parsed(&[]),
            &parsed(&[("Vary", "*")]),
        ));
    }

    #[test]
    fn test_vary_field_absent_on_both_sides_matches() {
        assert!(headers_meet_vary_constraints(
            &parsed(&[]),
            &parsed(&[]),
            &parsed(&[("Vary", "Accept-Language")]),
        ));
    }

    #[test]
    fn test_vary_field_on_one_side_only_fails() {
        let response = parsed(&[("Vary", "Accept-Language")]);
        assert!(!headers_meet_vary_constraints(
            &parsed(&[("Accept-Language", "en")]),
            &parsed(&[]),
            &response,
        ));
        assert!(!headers_meet_vary_constraints(
            &parsed(&[]),
            &parsed(&[("Accept-Language", "en")]),
            &response,
        ));
    }

    #[test]
    fn test_vary_matching_values_match() {
        assert!(headers_meet_vary_constraints(
            &parsed(&[("Accept-Language", "en")]),
            &parsed(&[("Accept-Language", "en")]),
            &parsed(&[("Vary", "Accept-Language")]),
        ));
    }

    #[test]
    fn test_vary_different_values_fail() {
        assert!(!headers_meet_vary_constraints(
            &parsed(&[("Accept-Language", "fr")]),
            &parsed(&[("Accept-Language", "en")]),
            &parsed(&[("Vary", "Accept-Language")]),
        ));
    }

    #[test]
    fn test_vary_is_order_independent_but_count_sensitive() {
        let response = parsed(&[("Vary", "Accept-Language")]);
        // Reordered values still match
        assert!(headers_meet_vary_constraints(
            &parsed(&[("Accept-Language", "en"), ("Accept-Language", "fr")]),
            &parsed(&[("Accept-Language", "fr"), ("Accept-Language", "en")]),
            &response,
        ));
        // A removed value does not
        assert!(!headers_meet_vary_constraints(
            &parsed(&[("Accept-Language", "en")]),
            &parsed(&[("Accept-Language", "fr"), ("Accept-Language", "en")]),
            &response,
        ));
    }

    #[test]
    fn test_vary_checks_every_listed_field() {
        let response = parsed(&[("Vary", "Accept-Encoding, Accept-Language")]);
        assert!(!headers_meet_vary_constraints(
            &parsed(&[("Accept-Encoding", "gzip"), ("Accept-Language", "en")]),
            &parsed(&[("Accept-Encoding", "gzip"), ("Accept-Language", "fr")]),
            &response,
        ));
    }

    #[test]
    fn test_authorized_request_denied_without_permitting_directive() {
        assert!(!is_request_allowed_to_use_cache(
            &parsed(&[("Authorization", "Basic dXNlcjpwYXNz")]),
            &parsed(&[]),
            &parsed(&[("Cache-Control", "max-age=3600")]),
        ));
    }

    #[rstest]
    #[case::public("public")]
    #[case::must_revalidate("must-revalidate")]
    #[case::s_maxage("s-maxage=600")]
    fn test_authorized_request_allowed_with_directive(#[case] directive: &str) {
        let response = parsed(&[("Cache-Control", directive)]);
        assert!(is_request_allowed_to_use_cache(
            &parsed(&[("Authorization", "Basic dXNlcjpwYXNz")]),
            &parsed(&[]),
            &response,
        ));
    }

    #[test]
    fn test_removing_authorization_restores_reuse() {
        let response = parsed(&[("Cache-Control", "max-age=3600")]);
        assert!(!is_request_allowed_to_use_cache(
            &parsed(&[("Authorization", "Basic dXNlcjpwYXNz")]),
            &parsed(&[]),
            &response,
        ));
        assert!(is_request_allowed_to_use_cache(
            &parsed(&[]),
            &parsed(&[]),
            &response,
        ));
    }

    #[test]
    fn test_auth_gate_and_vary_must_both_hold() {
        let response = parsed(&[("Cache-Control", "public"), ("Vary", "Accept-Language")]);
        assert!(!is_request_allowed_to_use_cache(
            &parsed(&[
                ("Authorization", "Basic dXNlcjpwYXNz"),
                ("Accept-Language", "fr"),
            ]),
            &parsed(&[("Accept-Language", "en")]),
            &response,
        ));
    }

    fn entry(response_pairs: &[(&str, &str)], request_pairs: &[(&str, &str)]) -> CachedResponse {
        CachedResponse {
            key: CacheKey::for_request("/test"),
            status: StatusCode::OK,
            request_header: header_map(request_pairs),
            response_header: header_map(response_pairs),
            body: Bytes::new(),
            stored_at: SystemTime::now(),
            initial_age: 0,
        }
    }

    #[test]
    fn test_servable_requires_freshness() {
        // Reuse-allowed but no freshness information: never servable
        let stale = entry(&[], &[]);
        assert!(!is_servable(&stale, &parsed(&[])));
    }

    #[test]
    fn test_servable_requires_reuse_eligibility() {
        let fresh = entry(&[("Cache-Control", "max-age=60")], &[]);
        assert!(is_servable(&fresh, &parsed(&[])));
        assert!(!is_servable(
            &fresh,
            &parsed(&[("Authorization", "Basic dXNlcjpwYXNz")]),
        ));
    }
}
