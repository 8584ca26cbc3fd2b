//! Metric feed (EPAgent REST interface) configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where metric batches are POSTed.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct AgentConfig {
    /// URL scheme: `"http"` or `"https"`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Agent host.
    #[serde(default = "default_host")]
    #[validate(length(min = 1, message = "agent.host must not be empty"))]
    pub host: String,
    /// Agent port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Metric feed path.
    #[serde(default = "default_path")]
    pub path: String,
    /// Request timeout in milliseconds. Absent means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl AgentConfig {
    /// Full URL of the metric feed.
    pub fn feed_url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }

    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            path: default_path(),
            timeout_ms: None,
        }
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/apm/metricFeed".to_string()
}
