//! Interval delta computation.
//!
//! Every counter delta goes through [`diff`], which absorbs missing values
//! and counter resets as a zero-delta interval. Extended deltas are further
//! gated on the previous snapshot being a usable extended snapshot
//! ([`previous_valid`]).
//!
//! Upstream peers are matched by position within their upstream, not by
//! server address. If the server reorders peers between two polls, that
//! interval's peer deltas are computed against the wrong peer.

use crate::snapshot::{
    BasicStats, ExtendedStats, HealthChecks, Peer, ResponseCounts, ServerZone, Snapshot,
};

/// Clamped interval difference: `max(current - previous, 0)`, or 0 when
/// either side is absent.
pub fn diff(current: Option<i64>, previous: Option<i64>) -> i64 {
    match (current, previous) {
        (Some(current), Some(previous)) => current.saturating_sub(previous).max(0),
        _ => 0,
    }
}

/// `round(requests / handled)`, or 0 unless `requests > 0` and `handled != 0`.
///
/// Halves round away from zero.
pub fn requests_per_connection(requests: i64, handled: i64) -> i64 {
    if requests > 0 && handled != 0 {
        (requests as f64 / handled as f64).round() as i64
    } else {
        0
    }
}

/// Whether `previous` holds a numeric `requests.total`, i.e. can serve as
/// the baseline for extended deltas.
pub fn previous_valid(previous: Option<&Snapshot>) -> bool {
    matches!(previous, Some(Snapshot::Extended(prev)) if prev.requests_total.is_some())
}

/// Deltas for one poll, shaped like the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalDeltas {
    /// Deltas for a basic snapshot.
    Basic(BasicDeltas),
    /// Deltas for an extended snapshot.
    Extended(ExtendedDeltas),
}

/// Deltas derived from `stub_status` counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicDeltas {
    /// Connections handled during the interval.
    pub handled: i64,
    /// Requests served during the interval.
    pub requests: i64,
    /// Rounded requests per handled connection.
    pub requests_per_connection: i64,
}

/// Deltas derived from extended counters.
///
/// `zones` is index-aligned with the current snapshot's `server_zones`,
/// `upstreams` with its `upstreams`, and each upstream's `peers` with that
/// upstream's peer list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedDeltas {
    /// Whether the previous snapshot was a usable baseline.
    pub previous_valid: bool,
    /// Connections accepted during the interval.
    pub handled: i64,
    /// Requests served during the interval.
    pub requests: i64,
    /// Rounded requests per accepted connection.
    pub requests_per_connection: i64,
    /// TLS counter deltas.
    pub ssl: SslDeltas,
    /// Per-zone deltas.
    pub zones: Vec<ZoneDeltas>,
    /// Per-upstream deltas.
    pub upstreams: Vec<UpstreamDeltas>,
}

/// TLS counter deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslDeltas {
    /// Successful handshakes.
    pub handshakes: i64,
    /// Failed handshakes.
    pub handshakes_failed: i64,
    /// Reused sessions.
    pub session_reuses: i64,
}

/// Per-zone counter deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneDeltas {
    /// Requests received.
    pub requests: i64,
    /// Responses sent (`responses.total`).
    pub responses: i64,
    /// Discarded requests.
    pub discarded: i64,
    /// Requests in processing.
    pub processing: i64,
    /// Bytes sent.
    pub sent: i64,
    /// Bytes received.
    pub received: i64,
    /// Responses by status class, indexed like `RESPONSE_CLASSES`.
    pub responses_by_class: [i64; 5],
}

/// Deltas for all peers of one upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamDeltas {
    /// Per-peer deltas in the current snapshot's peer order.
    pub peers: Vec<PeerDeltas>,
}

/// Per-peer counter deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerDeltas {
    /// Requests forwarded.
    pub requests: i64,
    /// Bytes sent.
    pub sent: i64,
    /// Bytes received.
    pub received: i64,
    /// Responses by status class.
    pub responses_by_class: [i64; 5],
    /// Failed attempts.
    pub fails: i64,
    /// Unavailability transitions.
    pub unavail: i64,
    /// Health check deltas.
    pub health_checks: HealthCheckDeltas,
}

/// Health check counter deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheckDeltas {
    /// Checks performed.
    pub checks: i64,
    /// Failed checks.
    pub fails: i64,
    /// Unhealthy transitions.
    pub unhealthy: i64,
}

/// Computes [`IntervalDeltas`] from the current and previous snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaEngine;

impl DeltaEngine {
    /// Compute the deltas between `current` and `previous`.
    ///
    /// `previous` is `None` on the first poll. Neither snapshot is modified.
    pub fn compute(current: &Snapshot, previous: Option<&Snapshot>) -> IntervalDeltas {
        match current {
            Snapshot::Basic(current) => {
                let previous = match previous {
                    Some(Snapshot::Basic(prev)) => Some(prev),
                    _ => None,
                };
                IntervalDeltas::Basic(Self::basic(current, previous))
            }
            Snapshot::Extended(current) => {
                let valid = previous_valid(previous);
                let previous = match previous {
                    Some(Snapshot::Extended(prev)) => Some(prev),
                    _ => None,
                };
                IntervalDeltas::Extended(Self::extended(current, previous, valid))
            }
        }
    }

    fn basic(current: &BasicStats, previous: Option<&BasicStats>) -> BasicDeltas {
        let handled = diff(current.handled, previous.and_then(|p| p.handled));
        let requests = diff(current.requests, previous.and_then(|p| p.requests));

        BasicDeltas {
            handled,
            requests,
            requests_per_connection: requests_per_connection(requests, handled),
        }
    }

    fn extended(
        current: &ExtendedStats,
        previous: Option<&ExtendedStats>,
        previous_valid: bool,
    ) -> ExtendedDeltas {
        // Every extended delta needs a valid baseline.
        let baseline = previous.filter(|_| previous_valid);

        let handled = diff(
            current.connections.accepted,
            baseline.and_then(|p| p.connections.accepted),
        );
        let requests = diff(current.requests_total, baseline.and_then(|p| p.requests_total));

        let ssl = match baseline {
            Some(prev) => SslDeltas {
                handshakes: diff(current.ssl.handshakes, prev.ssl.handshakes),
                handshakes_failed: diff(current.ssl.handshakes_failed, prev.ssl.handshakes_failed),
                session_reuses: diff(current.ssl.session_reuses, prev.ssl.session_reuses),
            },
            None => SslDeltas::default(),
        };

        let zones = current
            .server_zones
            .iter()
            .map(|zone| {
                let prev = baseline.and_then(|p| p.zone(&zone.name));
                zone_deltas(zone, prev)
            })
            .collect();

        let upstreams = current
            .upstreams
            .iter()
            .map(|upstream| {
                let prev_peers = baseline
                    .and_then(|p| p.upstream(&upstream.name))
                    .map(|u| u.peers.as_slice())
                    .unwrap_or_default();
                UpstreamDeltas {
                    peers: upstream
                        .peers
                        .iter()
                        .enumerate()
                        .map(|(index, peer)| peer_deltas(peer, prev_peers.get(index)))
                        .collect(),
                }
            })
            .collect();

        ExtendedDeltas {
            previous_valid,
            handled,
            requests,
            requests_per_connection: requests_per_connection(requests, handled),
            ssl,
            zones,
            upstreams,
        }
    }
}

fn zone_deltas(current: &ServerZone, previous: Option<&ServerZone>) -> ZoneDeltas {
    let Some(prev) = previous else {
        return ZoneDeltas::default();
    };
    ZoneDeltas {
        requests: diff(current.requests, prev.requests),
        responses: diff(current.responses.total, prev.responses.total),
        discarded: diff(current.discarded, prev.discarded),
        processing: diff(current.processing, prev.processing),
        sent: diff(current.sent, prev.sent),
        received: diff(current.received, prev.received),
        responses_by_class: class_deltas(&current.responses, &prev.responses),
    }
}

fn peer_deltas(current: &Peer, previous: Option<&Peer>) -> PeerDeltas {
    let Some(prev) = previous else {
        return PeerDeltas::default();
    };
    PeerDeltas {
        requests: diff(current.requests, prev.requests),
        sent: diff(current.sent, prev.sent),
        received: diff(current.received, prev.received),
        responses_by_class: class_deltas(&current.responses, &prev.responses),
        fails: diff(current.fails, prev.fails),
        unavail: diff(current.unavail, prev.unavail),
        health_checks: health_deltas(&current.health_checks, &prev.health_checks),
    }
}

fn class_deltas(current: &ResponseCounts, previous: &ResponseCounts) -> [i64; 5] {
    std::array::from_fn(|i| diff(current.by_class[i], previous.by_class[i]))
}

fn health_deltas(current: &HealthChecks, previous: &HealthChecks) -> HealthCheckDeltas {
    HealthCheckDeltas {
        checks: diff(current.checks, previous.checks),
        fails: diff(current.fails, previous.fails),
        unhealthy: diff(current.unhealthy, previous.unhealthy),
    }
}
