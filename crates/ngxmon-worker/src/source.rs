//! HTTP status source for the nginx status endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;

use ngxmon_core::config::NginxConfig;
use ngxmon_core::error::{AppError, ErrorKind};
use ngxmon_core::result::AppResult;
use ngxmon_core::traits::{StatusResponse, StatusSource};

use crate::http::{ClientOptions, build_client};

/// Fetches the status page over HTTP(S), with optional basic auth.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    /// Underlying client.
    client: reqwest::Client,
    /// Status page URL.
    url: String,
    /// Basic-auth credentials.
    credentials: Option<(String, Option<String>)>,
}

impl HttpStatusSource {
    /// Create a source from the `nginx` config section.
    pub fn new(config: &NginxConfig) -> AppResult<Self> {
        let client = build_client(&ClientOptions {
            timeout: config.timeout(),
            accept_invalid_certs: !config.strict_ssl,
            proxy: None,
        })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    /// The status page URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> AppResult<StatusResponse> {
        let mut request = self.client.get(&self.url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Fetch,
                format!("Failed to reach nginx at {}: {e}", self.url),
                e,
            )
        })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => {
                return Err(AppError::authentication(
                    "Nginx returned with an error - recheck the username/password you provided",
                ));
            }
            status => {
                return Err(AppError::fetch(format!(
                    "Nginx returned with an error ({status}) - recheck the URL you provided"
                )));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Fetch,
                format!("Failed to read nginx response body: {e}"),
                e,
            )
        })?;

        if body.is_empty() {
            return Err(AppError::empty_body("Nginx statistics return empty"));
        }

        tracing::trace!(
            bytes = body.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "Fetched nginx status"
        );

        Ok(StatusResponse { body, content_type })
    }
}
