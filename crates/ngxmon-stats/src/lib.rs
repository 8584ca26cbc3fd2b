//! # ngxmon-stats
//!
//! The stateful part of ngxmon: turns successive nginx status pages into
//! interval metrics.
//!
//! ```text
//! body ─▶ parser ─▶ RawStats ─▶ classifier ─▶ Snapshot ─┐
//!                                   previous Snapshot ──┴▶ delta ─▶ projector ─▶ MetricRecord list
//! ```
//!
//! [`StatsPipeline`] runs one cycle of that flow and owns the
//! [`SnapshotStore`] holding the previous snapshot.

pub mod classifier;
pub mod delta;
pub mod error;
pub mod naming;
pub mod parser;
pub mod pipeline;
pub mod projector;
pub mod snapshot;
pub mod store;

pub use classifier::Schema;
pub use delta::{DeltaEngine, IntervalDeltas};
pub use error::StatsError;
pub use pipeline::StatsPipeline;
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
