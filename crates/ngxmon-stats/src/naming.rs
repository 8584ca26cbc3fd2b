//! Metric name construction.
//!
//! Names use `|` between hierarchy levels and `:` before the leaf label,
//! e.g. `nginx|web01|Server Zone|www:Requests per Interval`. Segments that
//! come from the monitored server (zone, upstream and peer names) have both
//! separators replaced by `_`.

/// First segment of every metric name.
pub const ROOT: &str = "nginx";

/// Replace `|` and `:` with `_`.
pub fn sanitize(segment: &str) -> String {
    segment.replace(['|', ':'], "_")
}

/// A metric name prefix under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPath {
    prefix: String,
}

impl MetricPath {
    /// `nginx|<source>`.
    pub fn root(source: &str) -> Self {
        Self {
            prefix: format!("{ROOT}|{source}"),
        }
    }

    /// Append a fixed segment verbatim.
    pub fn child(&self, segment: &str) -> Self {
        Self {
            prefix: format!("{}|{}", self.prefix, segment),
        }
    }

    /// Append a server-supplied segment, sanitized.
    pub fn dynamic(&self, segment: &str) -> Self {
        self.child(&sanitize(segment))
    }

    /// Finish the name with a leaf label.
    pub fn leaf(&self, label: &str) -> String {
        format!("{}:{}", self.prefix, label)
    }
}
