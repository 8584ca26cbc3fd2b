//! Status endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where and how to fetch the nginx status page.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct NginxConfig {
    /// Full URL of the `stub_status` or extended status endpoint.
    #[validate(length(min = 1, message = "nginx.url must not be empty"))]
    pub url: String,
    /// Basic-auth user name, passed through unchanged.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password, passed through unchanged.
    #[serde(default)]
    pub password: Option<String>,
    /// Verify the endpoint's TLS certificate. `false` accepts self-signed certificates.
    #[serde(default = "default_true")]
    pub strict_ssl: bool,
    /// Request timeout in milliseconds. Absent means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl NginxConfig {
    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn default_true() -> bool {
    true
}
