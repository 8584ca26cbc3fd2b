//! Metric records in the monitoring backend's wire format.
//!
//! A batch serializes as
//! `{"metrics":[{"type":"IntAverage","name":"nginx|host|Connections:Active","value":3}]}`.

use serde::{Deserialize, Serialize};

/// Record type understood by the metric feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Integer value averaged by the backend over its reporting window.
    IntAverage,
    /// Free-form string value.
    StringEvent,
}

/// A metric value: integer for `IntAverage`, string for `StringEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integer value.
    Int(i64),
    /// String value.
    Text(String),
}

/// One named, typed metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Record type.
    #[serde(rename = "type")]
    pub kind: MetricKind,
    /// Hierarchical metric path.
    pub name: String,
    /// Metric value.
    pub value: MetricValue,
}

impl MetricRecord {
    /// An `IntAverage` record.
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self {
            kind: MetricKind::IntAverage,
            name: name.into(),
            value: MetricValue::Int(value),
        }
    }

    /// A `StringEvent` record.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: MetricKind::StringEvent,
            name: name.into(),
            value: MetricValue::Text(value.into()),
        }
    }

    /// The integer value, if this is an integer record.
    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            MetricValue::Int(v) => Some(v),
            MetricValue::Text(_) => None,
        }
    }
}

/// The body of one metric feed POST.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBatch {
    /// Records in emission order.
    pub metrics: Vec<MetricRecord>,
}

impl MetricBatch {
    /// Wrap a list of records.
    pub fn new(metrics: Vec<MetricRecord>) -> Self {
        Self { metrics }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the batch has no records.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Look up a record by its full name.
    pub fn get(&self, name: &str) -> Option<&MetricRecord> {
        self.metrics.iter().find(|m| m.name == name)
    }
}
