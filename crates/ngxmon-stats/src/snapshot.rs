//! Typed, classified status snapshots.
//!
//! A [`Snapshot`] is produced once per poll by [`Snapshot::from_raw`] and is
//! never modified afterwards. Counter fields are `Option<i64>`: `None` means
//! the field was absent or not a number, which the delta engine treats as
//! "no value".

use serde_json::Value;

use crate::classifier::{self, Schema};
use crate::parser::RawStats;

/// Response status classes reported per zone and per peer, in emission order.
pub const RESPONSE_CLASSES: [&str; 5] = ["1xx", "2xx", "3xx", "4xx", "5xx"];

/// One classified status sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// `stub_status` counters.
    Basic(BasicStats),
    /// Extended status module counters.
    Extended(ExtendedStats),
}

impl Snapshot {
    /// Classify and extract a raw status tree.
    pub fn from_raw(raw: &RawStats) -> Self {
        match classifier::classify(raw) {
            Schema::Basic => Self::Basic(BasicStats::from_raw(raw)),
            Schema::Extended => Self::Extended(ExtendedStats::from_raw(raw)),
        }
    }

    /// The schema this snapshot was classified as.
    pub fn schema(&self) -> Schema {
        match self {
            Self::Basic(_) => Schema::Basic,
            Self::Extended(_) => Schema::Extended,
        }
    }
}

/// Flat `stub_status` counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicStats {
    /// Currently open client connections.
    pub connections: Option<i64>,
    /// Connections reading the request header.
    pub reading: Option<i64>,
    /// Connections writing the response.
    pub writing: Option<i64>,
    /// Idle keep-alive connections.
    pub waiting: Option<i64>,
    /// Accepted connections since start.
    pub accepts: Option<i64>,
    /// Handled connections since start.
    pub handled: Option<i64>,
    /// Client requests since start.
    pub requests: Option<i64>,
    /// `accepts - handled`.
    pub nothandled: Option<i64>,
}

impl BasicStats {
    fn from_raw(raw: &RawStats) -> Self {
        let accepts = int_field(raw, "accepts");
        let handled = int_field(raw, "handled");
        let nothandled = int_field(raw, "nothandled").or(match (accepts, handled) {
            (Some(a), Some(h)) => Some(a.saturating_sub(h)),
            _ => None,
        });

        Self {
            connections: int_field(raw, "connections"),
            reading: int_field(raw, "reading"),
            writing: int_field(raw, "writing"),
            waiting: int_field(raw, "waiting"),
            accepts,
            handled,
            requests: int_field(raw, "requests"),
            nothandled,
        }
    }
}

/// Nested counters of the extended status module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedStats {
    /// Client connection counters.
    pub connections: ConnectionStats,
    /// `requests.total`.
    pub requests_total: Option<i64>,
    /// TLS counters.
    pub ssl: SslStats,
    /// Server zones in document order.
    pub server_zones: Vec<ServerZone>,
    /// Upstream groups in document order.
    pub upstreams: Vec<Upstream>,
}

/// `connections{active,idle,accepted,dropped}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Active connections (gauge).
    pub active: Option<i64>,
    /// Idle connections (gauge).
    pub idle: Option<i64>,
    /// Accepted connections (counter).
    pub accepted: Option<i64>,
    /// Dropped connections (reported as-is).
    pub dropped: Option<i64>,
}

/// `ssl{handshakes,handshakes_failed,session_reuses}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslStats {
    /// Successful handshakes.
    pub handshakes: Option<i64>,
    /// Failed handshakes.
    pub handshakes_failed: Option<i64>,
    /// Reused sessions.
    pub session_reuses: Option<i64>,
}

/// Response counts by status class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseCounts {
    /// Counts indexed like [`RESPONSE_CLASSES`].
    pub by_class: [Option<i64>; 5],
    /// `responses.total`.
    pub total: Option<i64>,
}

/// One `server_zones` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerZone {
    /// Zone name as reported by the server.
    pub name: String,
    /// Requests received.
    pub requests: Option<i64>,
    /// Requests completed without a response.
    pub discarded: Option<i64>,
    /// Requests being processed.
    pub processing: Option<i64>,
    /// Responses sent.
    pub responses: ResponseCounts,
    /// Bytes sent to clients.
    pub sent: Option<i64>,
    /// Bytes received from clients.
    pub received: Option<i64>,
}

/// One upstream group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upstream {
    /// Upstream name as reported by the server.
    pub name: String,
    /// Peers in reported order.
    pub peers: Vec<Peer>,
}

/// One backend server of an upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Peer {
    /// Server address, used as the peer's metric path segment.
    pub server: String,
    /// Whether this is a backup server.
    pub backup: Option<bool>,
    /// Current state (`up`, `down`, `unavail`, ...).
    pub state: Option<String>,
    /// Configured weight.
    pub weight: Option<i64>,
    /// Active connections.
    pub active: Option<i64>,
    /// Requests forwarded.
    pub requests: Option<i64>,
    /// Bytes sent to this server.
    pub sent: Option<i64>,
    /// Bytes received from this server.
    pub received: Option<i64>,
    /// Responses received.
    pub responses: ResponseCounts,
    /// Failed attempts.
    pub fails: Option<i64>,
    /// Times the server became unavailable.
    pub unavail: Option<i64>,
    /// Active health check counters.
    pub health_checks: HealthChecks,
}

/// `health_checks{checks,fails,unhealthy}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthChecks {
    /// Checks performed.
    pub checks: Option<i64>,
    /// Failed checks.
    pub fails: Option<i64>,
    /// Times the server became unhealthy.
    pub unhealthy: Option<i64>,
}

impl ExtendedStats {
    fn from_raw(raw: &RawStats) -> Self {
        let connections = raw.get("connections").and_then(Value::as_object);
        let ssl = raw.get("ssl").and_then(Value::as_object);

        Self {
            connections: ConnectionStats {
                active: connections.and_then(|c| int_field(c, "active")),
                idle: connections.and_then(|c| int_field(c, "idle")),
                accepted: connections.and_then(|c| int_field(c, "accepted")),
                dropped: connections.and_then(|c| int_field(c, "dropped")),
            },
            requests_total: raw
                .get("requests")
                .and_then(Value::as_object)
                .and_then(|r| int_field(r, "total")),
            ssl: SslStats {
                handshakes: ssl.and_then(|s| int_field(s, "handshakes")),
                handshakes_failed: ssl.and_then(|s| int_field(s, "handshakes_failed")),
                session_reuses: ssl.and_then(|s| int_field(s, "session_reuses")),
            },
            server_zones: raw
                .get("server_zones")
                .and_then(Value::as_object)
                .map(|zones| {
                    zones
                        .iter()
                        .map(|(name, zone)| ServerZone::from_value(name, zone))
                        .collect()
                })
                .unwrap_or_default(),
            upstreams: raw
                .get("upstreams")
                .and_then(Value::as_object)
                .map(|ups| {
                    ups.iter()
                        .map(|(name, upstream)| Upstream::from_value(name, upstream))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Look up a server zone by name.
    pub fn zone(&self, name: &str) -> Option<&ServerZone> {
        self.server_zones.iter().find(|z| z.name == name)
    }

    /// Look up an upstream by name.
    pub fn upstream(&self, name: &str) -> Option<&Upstream> {
        self.upstreams.iter().find(|u| u.name == name)
    }
}

impl ResponseCounts {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            by_class: RESPONSE_CLASSES.map(|class| int_field(map, class)),
            total: int_field(map, "total"),
        }
    }
}

impl ServerZone {
    fn from_value(name: &str, value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self {
                name: name.to_string(),
                ..Default::default()
            };
        };
        Self {
            name: name.to_string(),
            requests: int_field(map, "requests"),
            discarded: int_field(map, "discarded"),
            processing: int_field(map, "processing"),
            responses: ResponseCounts::from_value(map.get("responses")),
            sent: int_field(map, "sent"),
            received: int_field(map, "received"),
        }
    }
}

impl Upstream {
    /// Upstreams come either as a bare peer list or as `{"peers": [...]}`.
    fn from_value(name: &str, value: &Value) -> Self {
        let peers = match value {
            Value::Array(peers) => Some(peers),
            Value::Object(map) => map.get("peers").and_then(Value::as_array),
            _ => None,
        };

        Self {
            name: name.to_string(),
            peers: peers
                .map(|peers| {
                    peers
                        .iter()
                        .enumerate()
                        .map(|(index, peer)| Peer::from_value(index, peer))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl Peer {
    fn from_value(index: usize, value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self {
                server: format!("peer-{index}"),
                ..Default::default()
            };
        };

        let server = str_field(map, "server")
            .or_else(|| str_field(map, "name"))
            .unwrap_or_else(|| format!("peer-{index}"));
        let health = map.get("health_checks").and_then(Value::as_object);

        Self {
            server,
            backup: map.get("backup").and_then(Value::as_bool),
            state: str_field(map, "state"),
            weight: int_field(map, "weight"),
            active: int_field(map, "active"),
            requests: int_field(map, "requests"),
            sent: int_field(map, "sent"),
            received: int_field(map, "received"),
            responses: ResponseCounts::from_value(map.get("responses")),
            fails: int_field(map, "fails"),
            unavail: int_field(map, "unavail"),
            health_checks: HealthChecks {
                checks: health.and_then(|h| int_field(h, "checks")),
                fails: health.and_then(|h| int_field(h, "fails")),
                unhealthy: health.and_then(|h| int_field(h, "unhealthy")),
            },
        }
    }
}

/// A numeric field as `i64`. Fractional values are truncated.
fn int_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<i64> {
    let value = map.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn str_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}
