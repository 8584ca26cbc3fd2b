//! Schema classification.
//!
//! `stub_status` and the extended status module share field names but not
//! shapes: the extended module nests `requests` (`{"total": ..}`) while the
//! stub module reports it as a plain counter.

use std::fmt;

use serde_json::Value;

use crate::parser::RawStats;

/// The two mutually exclusive status shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    /// Flat `stub_status` counters.
    Basic,
    /// Nested extended status counters with zones and upstreams.
    Extended,
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

/// Extended iff `requests` is an object and `handled` is not nested.
pub fn classify(raw: &RawStats) -> Schema {
    let requests_nested = matches!(raw.get("requests"), Some(Value::Object(_)));
    let handled_nested = matches!(
        raw.get("handled"),
        Some(Value::Object(_)) | Some(Value::Array(_))
    );

    if requests_nested && !handled_nested {
        Schema::Extended
    } else {
        Schema::Basic
    }
}
