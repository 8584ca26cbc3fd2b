//! Topology and extension registration configuration.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Settings for registering the nginx vertex and extension config with the
/// management API.
///
/// Host, token, connection and proxy checks apply only when `enabled`.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[validate(schema(function = "validate_registration"))]
pub struct TopologyConfig {
    /// Whether registration is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Management API host.
    #[serde(default)]
    pub host: String,
    /// Management API port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// `"http"` or `"https"`.
    #[serde(default = "default_connection")]
    pub connection: String,
    /// Bearer token sent with every registration request.
    #[serde(default)]
    pub token: String,
    /// Agent name reported in the vertex attributes.
    #[serde(default)]
    pub agent_name: String,
    /// Version string of the extension configuration document.
    #[serde(default = "default_config_version")]
    pub config_version: String,
    /// Interval in milliseconds between vertex refreshes.
    #[serde(default = "default_refresh")]
    #[validate(range(min = 1, message = "topology.refresh_ms must be positive"))]
    pub refresh_ms: u64,
    /// Verify the management API's TLS certificate.
    #[serde(default)]
    pub strict_ssl: bool,
    /// Optional forward proxy.
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Request timeout in milliseconds. Absent means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Kind of forward proxy in front of the management API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    /// Direct connection.
    #[default]
    None,
    /// Plain HTTP proxy; requests are sent in absolute form.
    Http,
    /// HTTPS proxy reached through a `CONNECT` tunnel.
    Https,
}

/// Forward proxy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy kind.
    #[serde(default)]
    pub kind: ProxyKind,
    /// Proxy host.
    #[serde(default)]
    pub host: String,
    /// Proxy port.
    #[serde(default)]
    pub port: u16,
}

impl ProxyConfig {
    /// URL of the proxy, or `None` for a direct connection.
    pub fn url(&self) -> Option<String> {
        match self.kind {
            ProxyKind::None => None,
            ProxyKind::Http | ProxyKind::Https => {
                Some(format!("http://{}:{}", self.host, self.port))
            }
        }
    }
}

impl TopologyConfig {
    /// Base URL of the management API.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.connection, self.host, self.port)
    }

    /// The delay between vertex refreshes.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: default_port(),
            connection: default_connection(),
            token: String::new(),
            agent_name: String::new(),
            config_version: default_config_version(),
            refresh_ms: default_refresh(),
            strict_ssl: false,
            proxy: ProxyConfig::default(),
            timeout_ms: None,
        }
    }
}

fn validate_registration(config: &TopologyConfig) -> Result<(), ValidationError> {
    if !config.enabled {
        return Ok(());
    }
    if config.host.trim().is_empty() {
        return Err(invalid(
            "topology_host",
            "topology.host is required when topology is enabled",
        ));
    }
    if config.token.trim().is_empty() {
        return Err(invalid(
            "topology_token",
            "topology.token is required when topology is enabled",
        ));
    }
    if !matches!(config.connection.as_str(), "http" | "https") {
        return Err(invalid(
            "topology_connection",
            "topology.connection must be 'http' or 'https'",
        ));
    }
    if config.proxy.kind != ProxyKind::None && config.proxy.host.trim().is_empty() {
        return Err(invalid(
            "topology_proxy_host",
            "topology.proxy.host is required when a proxy kind is set",
        ));
    }
    Ok(())
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn default_port() -> u16 {
    8081
}

fn default_connection() -> String {
    "http".to_string()
}

fn default_config_version() -> String {
    "1.0".to_string()
}

fn default_refresh() -> u64 {
    3_600_000
}
