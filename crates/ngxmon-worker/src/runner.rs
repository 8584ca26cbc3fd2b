//! Poll runner: fixed-interval loop that fetches, processes, and forwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use ngxmon_core::traits::StatusSource;
use ngxmon_core::types::MetricBatch;
use ngxmon_stats::StatsPipeline;

use crate::error::PollError;
use crate::forwarder::MetricForwarder;

/// Drives poll cycles one at a time.
///
/// The interval sleep starts only after a cycle has finished, so cycles never
/// overlap and the pipeline's snapshot store needs no locking.
#[derive(Debug)]
pub struct PollRunner {
    /// Status page source
    source: Arc<dyn StatusSource>,
    /// Parse/diff/project pipeline (owns the previous snapshot)
    pipeline: StatsPipeline,
    /// Metric feed forwarder; `None` disables forwarding
    forwarder: Option<Arc<MetricForwarder>>,
    /// Delay between the end of one cycle and the start of the next
    interval: Duration,
}

impl PollRunner {
    /// Create a new poll runner
    pub fn new(
        source: Arc<dyn StatusSource>,
        pipeline: StatsPipeline,
        forwarder: Option<Arc<MetricForwarder>>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            pipeline,
            forwarder,
            interval,
        }
    }

    /// The pipeline, for inspecting the stored snapshot
    pub fn pipeline(&self) -> &StatsPipeline {
        &self.pipeline
    }

    /// Fetch and process one status page without forwarding.
    pub async fn poll_once(&mut self) -> Result<MetricBatch, PollError> {
        let response = self.source.fetch().await?;
        let batch = self
            .pipeline
            .process(&response.body, response.content_type.as_deref())?;
        Ok(batch)
    }

    /// Run one full cycle.
    ///
    /// Returns the handle of the spawned forward, if one was started. Errors
    /// are logged and leave the stored snapshot untouched.
    pub async fn cycle(&mut self) -> Option<JoinHandle<()>> {
        match self.poll_once().await {
            Ok(batch) => {
                tracing::debug!(records = batch.len(), "Poll cycle completed");
                self.forwarder
                    .as_ref()
                    .map(|forwarder| forwarder.spawn(batch))
            }
            Err(e) => {
                tracing::error!(kind = %e.kind(), "Poll cycle failed: {}", e);
                None
            }
        }
    }

    /// Run cycles until `cancel` becomes `true` or its sender is dropped.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            source = %self.pipeline.source(),
            interval_ms = self.interval.as_millis() as u64,
            forwarding = self.forwarder.is_some(),
            "Poll runner started"
        );

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    // A dropped sender also means shutdown.
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Poll runner received shutdown signal");
                        break;
                    }
                }
                _ = self.cycle() => {
                    tokio::select! {
                        changed = cancel.changed() => {
                            if changed.is_err() || *cancel.borrow() {
                                tracing::info!("Poll runner shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(self.interval) => {}
                    }
                }
            }
        }

        tracing::info!("Poll runner shut down complete");
    }
}
