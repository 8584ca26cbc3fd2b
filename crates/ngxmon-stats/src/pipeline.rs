//! One poll cycle's worth of stats processing.

use ngxmon_core::types::MetricBatch;

use crate::delta::DeltaEngine;
use crate::error::StatsError;
use crate::parser;
use crate::projector;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Parses, classifies, diffs and projects status pages, keeping the
/// previous snapshot between calls.
#[derive(Debug, Clone)]
pub struct StatsPipeline {
    /// Metric source identifier (second name segment).
    source: String,
    /// Previous successful snapshot.
    store: SnapshotStore,
}

impl StatsPipeline {
    /// Create a pipeline with an empty store.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            store: SnapshotStore::new(),
        }
    }

    /// The metric source identifier.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The previous-snapshot store.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Turn one status body into a metric batch.
    ///
    /// On a parse error the store is left unchanged. On success the store
    /// holds the new snapshot afterwards.
    pub fn process(
        &mut self,
        body: &str,
        content_type: Option<&str>,
    ) -> Result<MetricBatch, StatsError> {
        let raw = parser::parse(body, content_type)?;
        let snapshot = Snapshot::from_raw(&raw);
        let deltas = DeltaEngine::compute(&snapshot, self.store.previous());
        let metrics = projector::project(&self.source, &snapshot, &deltas);

        tracing::debug!(
            schema = %snapshot.schema(),
            first_poll = self.store.is_empty(),
            records = metrics.len(),
            "Processed status snapshot"
        );

        self.store.replace(snapshot);
        Ok(MetricBatch::new(metrics))
    }
}
