//! Outbound transport abstraction.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;
use crate::types::Endpoint;

/// Sends a JSON payload to an endpoint.
///
/// The metric forwarder and the topology registrar depend only on this
/// trait; proxy tunneling and TLS settings live in the implementation
/// (`ngxmon-worker`).
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug + 'static {
    /// POST `payload` as `application/json` to `endpoint`.
    ///
    /// Returns an error of kind `Transport` when the request could not be
    /// delivered or the peer answered with a non-success status.
    async fn send(&self, endpoint: &Endpoint, payload: Bytes) -> AppResult<()>;
}
