// Configuration module

use http::Uri;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::ProxyError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub origin: OriginConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (default: 127.0.0.1)
    #[serde(default = "default_address")]
    pub address: String,

    /// Port to listen on (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Origin server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Absolute http URL of the origin, e.g. "http://localhost:9000"
    pub url: String,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local runs
    #[default]
    Pretty,
    /// JSON lines for log aggregation systems
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (default: pretty)
    #[serde(default)]
    pub format: LogFormat,
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProxyError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|err| ProxyError::Config(format!("failed to read config file: {}", err)))?;
        Self::from_yaml(&yaml)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProxyError> {
        serde_yaml::from_str(yaml)
            .map_err(|err| ProxyError::Config(format!("invalid config: {}", err)))
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.server.port == 0 {
            return Err(ProxyError::Config("server port cannot be 0".to_string()));
        }
        self.origin_uri().map(|_| ())
    }

    /// The origin URL parsed as an absolute http URI.
    pub fn origin_uri(&self) -> Result<Uri, ProxyError> {
        let uri: Uri = self.origin.url.parse().map_err(|err| {
            ProxyError::Config(format!("invalid origin url '{}': {}", self.origin.url, err))
        })?;

        if uri.scheme_str() != Some("http") {
            return Err(ProxyError::Config(format!(
                "origin url '{}' must use the http scheme",
                self.origin.url
            )));
        }
        if uri.authority().is_none() {
            return Err(ProxyError::Config(format!(
                "origin url '{}' is missing a host",
                self.origin.url
            )));
        }

        Ok(uri)
    }
}

impl ServerConfig {
    /// Address and port combined into a bindable socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ProxyError> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .map_err(|err| {
                ProxyError::Config(format!(
                    "invalid listen address '{}:{}': {}",
                    self.address, self.port, err
                ))
            })
    }
}
