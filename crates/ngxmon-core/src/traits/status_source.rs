//! Status page source abstraction.

use async_trait::async_trait;

use crate::result::AppResult;

/// A successfully fetched, non-empty status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// Response body.
    pub body: String,
    /// Value of the `Content-Type` header, if present.
    pub content_type: Option<String>,
}

/// Fetches the raw status page of the monitored server.
#[async_trait]
pub trait StatusSource: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch the status page.
    ///
    /// Errors are classified by kind: `Fetch` for transport failures and
    /// unexpected statuses, `Authentication` for HTTP 401, `EmptyBody` for a
    /// 200 response without content.
    async fn fetch(&self) -> AppResult<StatusResponse>;
}
