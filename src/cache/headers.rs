//! Header parsing into a normalized, queryable structure.
//!
//! `ParsedHeaders` splits one header collection into two views:
//! - `directives`: structured name → directive → value maps for the
//!   directive-bearing headers (`Cache-Control`, `Pragma`, `Warning`,
//!   `CDN-Cache-Control`) and the specially-parsed `Authorization`
//! - `values`: plain ordered value lists for every other header
//!
//! A header name lands in exactly one of the two views. Parsing is total:
//! malformed directive syntax degrades to "directive absent" rather than
//! erroring. All lookups are case-insensitive on both header name and
//! directive name.

use http::HeaderMap;
use std::collections::HashMap;

/// Headers whose value is a comma-separated directive list.
const DIRECTIVE_HEADERS: [&str; 4] = ["cache-control", "pragma", "warning", "cdn-cache-control"];

/// Normalized view over one header collection.
///
/// Built once per request/response and never mutated afterwards. The two
/// maps are disjoint: a lower-cased header name appears either under
/// `directives` or under `values`, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    directives: HashMap<String, HashMap<String, String>>,
    values: HashMap<String, Vec<String>>,
}

/// Parse a comma-separated directive list into a name → value map.
///
/// Directive names are lower-cased; values have surrounding quotes
/// stripped. A directive without `=` maps to an empty string. Empty
/// segments are skipped.
fn parse_directives(header_value: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();

    for directive in header_value.split(',') {
        let directive = directive.trim();
        if directive.is_empty() {
            continue;
        }

        if let Some((name, value)) = directive.split_once('=') {
            let name = name.trim().to_lowercase();
            let value = value.trim().trim_matches('"').to_string();
            result.insert(name, value);
        } else {
            // Valueless directive, just the name
            result.insert(directive.to_lowercase(), String::new());
        }
    }

    result
}

/// Parse an `Authorization` header value into a structured map.
///
/// The scheme token is lower-cased under `scheme`. For `basic` the
/// parameter is stored verbatim under `credentials`. For `digest`, or any
/// scheme whose parameters contain `=`, the parameters are split on commas
/// into key/value pairs with quoted values unquoted. Anything else keeps
/// the raw parameter string under `parameters`.
fn parse_authorization(header_value: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();

    let Some((scheme, parameters)) = header_value.split_once(' ') else {
        return result;
    };

    let scheme = scheme.trim().to_lowercase();
    let parameters = parameters.trim();
    result.insert("scheme".to_string(), scheme.clone());

    if scheme == "basic" {
        result.insert("credentials".to_string(), parameters.to_string());
        return result;
    }

    if scheme == "digest" || parameters.contains('=') {
        for pair in parameters.split(',') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim().to_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                result.insert(name, value);
            }
        }
    } else {
        result.insert("parameters".to_string(), parameters.to_string());
    }

    result
}

impl ParsedHeaders {
    /// Parse a header collection. Deterministic and total; never fails.
    ///
    /// Multi-valued directive headers are joined with `,` before directive
    /// parsing, so `Cache-Control: no-store` on two lines behaves like one
    /// combined field value. Header values that are not valid UTF-8 are
    /// skipped.
    pub fn parse(headers: &HeaderMap) -> Self {
        let mut directives = HashMap::new();
        let mut values = HashMap::new();

        for name in headers.keys() {
            let name = name.as_str().to_string();
            let all: Vec<String> = headers
                .get_all(&name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_string)
                .collect();
            if all.is_empty() {
                continue;
            }

            if DIRECTIVE_HEADERS.contains(&name.as_str()) {
                directives.insert(name, parse_directives(&all.join(",")));
            } else if name == "authorization" {
                directives.insert(name, parse_authorization(&all.join(" ")));
            } else {
                values.insert(name, all);
            }
        }

        Self { directives, values }
    }

    /// Look up a single directive of a directive-bearing header.
    ///
    /// Returns the directive value, which is the empty string for a
    /// valueless directive such as `no-store`.
    pub fn directive(&self, header: &str, directive: &str) -> Option<&str> {
        self.directives
            .get(&header.to_lowercase())?
            .get(&directive.to_lowercase())
            .map(String::as_str)
    }

    /// Look up the whole directive map of a directive-bearing header.
    pub fn directives(&self, header: &str) -> Option<&HashMap<String, String>> {
        self.directives.get(&header.to_lowercase())
    }

    /// Look up the plain value list of a non-directive header.
    pub fn value(&self, header: &str) -> Option<&[String]> {
        self.values
            .get(&header.to_lowercase())
            .map(Vec::as_slice)
    }

    /// Read the `Age` header as non-negative seconds.
    ///
    /// A missing, malformed, or negative `Age` is treated as absent and
    /// yields 0; this is never an error.
    pub fn validated_age(&self) -> u64 {
        self.value("age")
            .and_then(|vals| vals.first())
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|age| *age >= 0)
            .map(|age| age as u64)
            .unwrap_or(0)
    }

    /// Field names listed in `Vary`, comma-split, trimmed and lower-cased.
    pub fn vary_fields(&self) -> Vec<String> {
        self.value("vary")
            .map(|vals| {
                vals.iter()
                    .flat_map(|v| v.split(','))
                    .map(|field| field.trim().to_lowercase())
                    .filter(|field| !field.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True iff the `Vary` field list contains the literal token `*`.
    pub fn is_vary_wildcard(&self) -> bool {
        self.vary_fields().iter().any(|field| field == "*")
    }
}
