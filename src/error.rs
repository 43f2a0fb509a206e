// Error types module

use http::StatusCode;
use thiserror::Error;

use crate::transport::TransportError;

/// Centralized error type for the proxy
///
/// Categorizes errors into the failure classes the proxy can hit, for
/// appropriate HTTP status code mapping and structured logging. Header
/// parsing never produces an error anywhere in the engine: malformed
/// directives and dates degrade to "absent" inside the cache modules.
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// Configuration errors (unreadable file, invalid YAML, bad origin URL)
    #[error("configuration error: {0}")]
    Config(String),

    /// Origin fetch failures (connect refused, reset, timeout)
    #[error("origin error: {0}")]
    Origin(String),

    /// Response body read failures while buffering for storage
    #[error("body error: {0}")]
    Body(String),

    /// Internal proxy errors (URI rewriting, unexpected states)
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status code this error maps to when surfaced in proxy mode.
    ///
    /// Origin communication failures are gateway-class (502); everything
    /// else the proxy itself is responsible for (500).
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Origin(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Config(_) | ProxyError::Body(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<TransportError> for ProxyError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Origin(msg) => ProxyError::Origin(msg),
            TransportError::Body(msg) => ProxyError::Body(msg),
        }
    }
}
