//! Freshness lifetime and current age computation.
//!
//! Implements a simplified RFC 9111 §4.2 model:
//! - freshness lifetime comes from `Cache-Control: max-age`, falling back
//!   to `Expires − Date`, falling back to zero (immediately stale)
//! - current age is the time elapsed since capture plus the single `Age`
//!   sample taken at capture time; transit delay is not modeled
//!
//! Malformed values never raise errors here: an unparseable `max-age`
//! behaves as absent and an unparseable HTTP date yields a zero lifetime.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

use super::entry::CachedResponse;
use super::headers::ParsedHeaders;

/// Parse an HTTP date (RFC 7231 §7.1.1.1) to epoch seconds.
///
/// Accepts IMF-fixdate plus the obsolete RFC 850 and asctime forms.
fn parse_http_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    // IMF-fixdate: "Sun, 06 Nov 1994 08:49:37 GMT"
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc).timestamp());
    }
    // RFC 850: "Sunday, 06-Nov-94 08:49:37 GMT"
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Some(date.and_utc().timestamp());
    }
    // asctime: "Sun Nov  6 08:49:37 1994"
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%a %b %e %H:%M:%S %Y") {
        return Some(date.and_utc().timestamp());
    }

    None
}

/// Compute the freshness lifetime of a response from its headers.
///
/// `max-age` wins when present and parseable as a non-negative integer,
/// regardless of `Expires`/`Date`. Otherwise `Expires − Date` clamped at
/// zero, and zero when either date is missing or malformed.
pub fn freshness_lifetime(headers: &ParsedHeaders) -> Duration {
    if let Some(max_age) = headers.directive("cache-control", "max-age") {
        if let Ok(seconds) = max_age.parse::<u64>() {
            return Duration::from_secs(seconds);
        }
    }

    let date = headers.value("date").and_then(|vals| vals.first());
    let expires = headers.value("expires").and_then(|vals| vals.first());
    let (Some(date), Some(expires)) = (date, expires) else {
        return Duration::ZERO;
    };
    let (Some(date), Some(expires)) = (parse_http_date(date), parse_http_date(expires)) else {
        return Duration::ZERO;
    };

    // A past Expires yields zero, never a negative lifetime
    Duration::from_secs((expires - date).max(0) as u64)
}

/// Current age of a stored entry in seconds: elapsed time since capture
/// plus the `Age` sample taken at capture time.
pub fn current_age(entry: &CachedResponse) -> u64 {
    let elapsed = entry
        .stored_at
        .elapsed()
        .unwrap_or(Duration::ZERO)
        .as_secs();
    elapsed + entry.initial_age
}

/// Whether a stored entry is still fresh.
///
/// Requires a positive freshness lifetime and a current age strictly below
/// it; a zero lifetime is always stale regardless of age.
pub fn is_fresh(entry: &CachedResponse) -> bool {
    let headers = ParsedHeaders::parse(&entry.response_header);
    let lifetime = freshness_lifetime(&headers);
    lifetime > Duration::ZERO && Duration::from_secs(current_age(entry)) < lifetime
}
