//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `NGXMON__`-prefixed environment variables. Each sub-module
//! represents a logical configuration section.

pub mod agent;
pub mod logging;
pub mod nginx;
pub mod poller;
pub mod topology;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub use self::agent::AgentConfig;
pub use self::logging::LoggingConfig;
pub use self::nginx::NginxConfig;
pub use self::poller::PollerConfig;
pub use self::topology::{ProxyConfig, ProxyKind, TopologyConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identifier used as the second metric path segment. Defaults to the
    /// host name when absent.
    #[serde(default)]
    #[validate(custom(function = "validate_source"))]
    pub source: Option<String>,
    /// Status endpoint settings.
    #[validate(nested)]
    pub nginx: NginxConfig,
    /// Poll scheduling settings.
    #[serde(default)]
    #[validate(nested)]
    pub poller: PollerConfig,
    /// Metric feed (EPAgent) settings.
    #[serde(default)]
    #[validate(nested)]
    pub agent: AgentConfig,
    /// Topology and extension registration settings.
    #[serde(default)]
    #[validate(nested)]
    pub topology: TopologyConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Sources are merged in order: `config/default`, `config/{env}`, the
    /// optional explicit file, then environment variables prefixed with
    /// `NGXMON__` (e.g. `NGXMON__NGINX__URL`).
    pub fn load(env: &str, explicit: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("NGXMON")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// The metric source identifier: the configured `source`, else the host name.
    pub fn resolved_source(&self) -> String {
        match &self.source {
            Some(source) => source.trim().to_string(),
            None => local_hostname(),
        }
    }
}

/// A source becomes a metric path segment, so it must not be blank or
/// contain the path separators.
fn validate_source(source: &str) -> Result<(), ValidationError> {
    if source.trim().is_empty() {
        return Err(ValidationError::new("blank_source")
            .with_message(Cow::Borrowed("source must not be blank")));
    }
    if source.contains(['|', ':']) {
        return Err(ValidationError::new("source_separator")
            .with_message(Cow::Borrowed("source must not contain '|' or ':'")));
    }
    Ok(())
}

/// Best-effort host name lookup.
///
/// Reads the kernel host name from `/proc/sys/kernel/hostname`, then
/// `/etc/hostname`, then the `HOSTNAME` variable. Outside Linux these may all
/// be absent, in which case `source` should be set explicitly.
fn local_hostname() -> String {
    first_hostname([
        std::fs::read_to_string("/proc/sys/kernel/hostname").ok(),
        std::fs::read_to_string("/etc/hostname").ok(),
        std::env::var("HOSTNAME").ok(),
    ])
}

/// The first non-blank candidate, trimmed, else `localhost`.
fn first_hostname(candidates: impl IntoIterator<Item = Option<String>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
