//! Shared `reqwest` client construction.

use std::time::Duration;

use ngxmon_core::error::{AppError, ErrorKind};
use ngxmon_core::result::AppResult;

/// Options for building an HTTP client.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Whole-request timeout. `None` leaves requests untimed.
    pub timeout: Option<Duration>,
    /// Accept invalid or self-signed TLS certificates.
    pub accept_invalid_certs: bool,
    /// Forward proxy URL for all requests.
    pub proxy: Option<String>,
}

/// Build a client from `options`.
pub fn build_client(options: &ClientOptions) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("ngxmon/", env!("CARGO_PKG_VERSION")))
        .danger_accept_invalid_certs(options.accept_invalid_certs);

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid proxy URL '{proxy}': {e}"),
                e,
            )
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Failed to build HTTP client: {e}"),
            e,
        )
    })
}
