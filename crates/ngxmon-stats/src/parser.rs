//! Raw status body parsing.
//!
//! The extended status module answers with JSON; `stub_status` answers with
//! three lines of text:
//!
//! ```text
//! Active connections: 1
//! server accepts handled requests
//!  112 112 121
//! Reading: 0 Writing: 1 Waiting: 0
//! ```
//!
//! Both are normalised into [`RawStats`], a JSON object tree, so the
//! classifier can treat them uniformly.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::error::StatsError;

/// A parsed but not yet classified status page.
pub type RawStats = Map<String, Value>;

const ACTIVE_MARKER: &str = "Active connections:";

static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+):\s*(\d+)").expect("valid key/value pattern"));

static TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(\d+)\s+(\d+)\s+(\d+)\s*$").expect("valid counter triple pattern")
});

/// Parse a status body using the response's content type as the format hint.
pub fn parse(body: &str, content_type: Option<&str>) -> Result<RawStats, StatsError> {
    if is_json(content_type) {
        parse_json(body)
    } else {
        parse_text(body)
    }
}

/// Whether a `Content-Type` header value denotes JSON.
///
/// Parameters such as `charset` are ignored.
pub fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Strictly parse a JSON status document.
pub fn parse_json(body: &str) -> Result<RawStats, StatsError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(StatsError::NotAnObject {
            found: json_type(&other),
        }),
    }
}

/// Parse `stub_status` text.
pub fn parse_text(body: &str) -> Result<RawStats, StatsError> {
    let mut stats = RawStats::new();

    for line in body.lines() {
        if line.starts_with(ACTIVE_MARKER) {
            if let Some(caps) = KEY_VALUE.captures(line) {
                insert(&mut stats, &caps[1].to_lowercase(), tolerant_int(&caps[2]));
            }
        } else if let Some(caps) = TRIPLE.captures(line) {
            let accepts = tolerant_int(&caps[1]);
            let handled = tolerant_int(&caps[2]);
            insert(&mut stats, "accepts", accepts);
            insert(&mut stats, "handled", handled);
            insert(&mut stats, "requests", tolerant_int(&caps[3]));
            // Negative when the counters are ill-formed; consumers clamp.
            insert(&mut stats, "nothandled", accepts.saturating_sub(handled));
        } else {
            for caps in KEY_VALUE.captures_iter(line) {
                insert(&mut stats, &caps[1].to_lowercase(), tolerant_int(&caps[2]));
            }
        }
    }

    if stats.is_empty() {
        return Err(StatsError::NoCounters);
    }

    tracing::trace!(keys = stats.len(), "Parsed stub_status text");
    Ok(stats)
}

/// Parse a leading base-10 integer, yielding 0 for anything unparseable.
///
/// Leading whitespace and a sign are accepted; parsing stops at the first
/// non-digit, so `"12ms"` reads as 12.
pub fn tolerant_int(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}

fn insert(stats: &mut RawStats, key: &str, value: i64) {
    stats.insert(key.to_string(), Value::Number(Number::from(value)));
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
