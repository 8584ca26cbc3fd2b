//! Metric feed forwarding.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;

use ngxmon_core::config::AgentConfig;
use ngxmon_core::result::AppResult;
use ngxmon_core::traits::Transport;
use ngxmon_core::types::{Endpoint, MetricBatch};

/// Sends metric batches to the EPAgent metric feed.
#[derive(Debug)]
pub struct MetricForwarder {
    /// Outbound transport.
    transport: Arc<dyn Transport>,
    /// Metric feed endpoint.
    endpoint: Endpoint,
}

impl MetricForwarder {
    /// Create a forwarder targeting `endpoint`.
    pub fn new(transport: Arc<dyn Transport>, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    /// Create a forwarder targeting the configured agent.
    pub fn from_config(transport: Arc<dyn Transport>, config: &AgentConfig) -> Self {
        Self::new(transport, Endpoint::new(config.feed_url()))
    }

    /// The metric feed endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Serialize and send `batch`.
    pub async fn forward(&self, batch: &MetricBatch) -> AppResult<()> {
        let payload = Bytes::from(serde_json::to_vec(batch)?);
        self.transport.send(&self.endpoint, payload).await
    }

    /// Send `batch` on a background task.
    ///
    /// Failures are logged at warn and otherwise ignored.
    pub fn spawn(self: &Arc<Self>, batch: MetricBatch) -> JoinHandle<()> {
        let forwarder = Arc::clone(self);
        tokio::spawn(async move {
            let count = batch.len();
            match forwarder.forward(&batch).await {
                Ok(()) => tracing::debug!(
                    records = count,
                    url = %forwarder.endpoint.url,
                    "Forwarded metrics"
                ),
                Err(e) => tracing::warn!(
                    records = count,
                    url = %forwarder.endpoint.url,
                    "Failed to forward metrics: {}",
                    e
                ),
            }
        })
    }
}
