//! HTTP implementation of [`Transport`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use ngxmon_core::error::{AppError, ErrorKind};
use ngxmon_core::result::AppResult;
use ngxmon_core::traits::Transport;
use ngxmon_core::types::Endpoint;

use crate::http::{ClientOptions, build_client};

/// POSTs JSON payloads with `reqwest`.
///
/// When a proxy is configured, plain-HTTP targets are sent to it in absolute
/// form and HTTPS targets are tunnelled through it with `CONNECT`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Underlying client.
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given client options.
    pub fn new(options: &ClientOptions) -> AppResult<Self> {
        Ok(Self {
            client: build_client(options)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Endpoint, payload: Bytes) -> AppResult<()> {
        let mut request = self
            .client
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);

        if let Some(token) = &endpoint.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Transport,
                format!("POST to {} failed: {e}", endpoint.url),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(format!(
                "POST to {} returned {status}",
                endpoint.url
            )));
        }

        tracing::trace!(url = %endpoint.url, %status, "POST completed");
        Ok(())
    }
}
