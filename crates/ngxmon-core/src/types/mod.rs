//! Core type definitions used across the ngxmon workspace.

pub mod endpoint;
pub mod metric;

pub use endpoint::Endpoint;
pub use metric::{MetricBatch, MetricKind, MetricRecord, MetricValue};
