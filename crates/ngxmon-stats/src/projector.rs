//! Projection of snapshots and deltas onto the metric feed schema.
//!
//! Record order is fixed and significant: consumers display metrics in the
//! order received.

use ngxmon_core::types::MetricRecord;

use crate::delta::{
    BasicDeltas, ExtendedDeltas, IntervalDeltas, PeerDeltas, UpstreamDeltas, ZoneDeltas,
};
use crate::naming::MetricPath;
use crate::snapshot::{BasicStats, ExtendedStats, Peer, RESPONSE_CLASSES, ServerZone, Snapshot};

/// Build the metric records for one poll.
///
/// `deltas` must have been computed from `snapshot`; a shape mismatch is
/// logged and projected with zero deltas.
pub fn project(source: &str, snapshot: &Snapshot, deltas: &IntervalDeltas) -> Vec<MetricRecord> {
    let root = MetricPath::root(source);

    match (snapshot, deltas) {
        (Snapshot::Basic(stats), IntervalDeltas::Basic(d)) => project_basic(&root, stats, d),
        (Snapshot::Extended(stats), IntervalDeltas::Extended(d)) => {
            project_extended(&root, stats, d)
        }
        (Snapshot::Basic(stats), IntervalDeltas::Extended(_)) => {
            tracing::warn!("Extended deltas supplied for a basic snapshot, reporting zero deltas");
            project_basic(&root, stats, &BasicDeltas::default())
        }
        (Snapshot::Extended(stats), IntervalDeltas::Basic(_)) => {
            tracing::warn!("Basic deltas supplied for an extended snapshot, reporting zero deltas");
            project_extended(&root, stats, &ExtendedDeltas::default())
        }
    }
}

fn project_basic(root: &MetricPath, stats: &BasicStats, deltas: &BasicDeltas) -> Vec<MetricRecord> {
    let conn = root.child("Connections");

    vec![
        MetricRecord::int(conn.leaf("Active"), gauge(stats.connections)),
        MetricRecord::int(conn.leaf("Idle"), gauge(stats.waiting)),
        MetricRecord::int(conn.leaf("Reading Request"), gauge(stats.reading)),
        MetricRecord::int(conn.leaf("Writing Response"), gauge(stats.writing)),
        MetricRecord::int(conn.leaf("Handled Connections"), deltas.handled),
        MetricRecord::int(
            conn.leaf("Dropped Connections"),
            gauge(stats.nothandled).max(0),
        ),
        MetricRecord::int(root.leaf("Requests per Interval"), deltas.requests),
        MetricRecord::int(
            root.leaf("Average Requests per Connection"),
            deltas.requests_per_connection,
        ),
    ]
}

fn project_extended(
    root: &MetricPath,
    stats: &ExtendedStats,
    deltas: &ExtendedDeltas,
) -> Vec<MetricRecord> {
    let conn = root.child("Connections");
    let ssl = root.child("SSL");

    let mut records = vec![
        MetricRecord::int(conn.leaf("Active"), gauge(stats.connections.active)),
        MetricRecord::int(conn.leaf("Idle"), gauge(stats.connections.idle)),
        MetricRecord::int(conn.leaf("Handled Connections"), deltas.handled),
        MetricRecord::int(
            conn.leaf("Dropped Connections"),
            gauge(stats.connections.dropped),
        ),
        MetricRecord::int(root.leaf("Requests per Interval"), deltas.requests),
        MetricRecord::int(
            root.leaf("Average Requests per Connection"),
            deltas.requests_per_connection,
        ),
        MetricRecord::int(ssl.leaf("Handshakes per Interval"), deltas.ssl.handshakes),
        MetricRecord::int(
            ssl.leaf("Handshakes Failed per Interval"),
            deltas.ssl.handshakes_failed,
        ),
        MetricRecord::int(
            ssl.leaf("Session Reuses per Interval"),
            deltas.ssl.session_reuses,
        ),
    ];

    let zones = root.child("Server Zone");
    let no_zone = ZoneDeltas::default();
    for (index, zone) in stats.server_zones.iter().enumerate() {
        let d = deltas.zones.get(index).unwrap_or(&no_zone);
        push_zone(&mut records, &zones, zone, d);
    }

    let upstreams = root.child("Upstreams");
    let no_upstream = UpstreamDeltas::default();
    let no_peer = PeerDeltas::default();
    for (index, upstream) in stats.upstreams.iter().enumerate() {
        let upstream_deltas = deltas.upstreams.get(index).unwrap_or(&no_upstream);
        let path = upstreams.dynamic(&upstream.name);
        for (peer_index, peer) in upstream.peers.iter().enumerate() {
            let d = upstream_deltas.peers.get(peer_index).unwrap_or(&no_peer);
            push_peer(&mut records, &path, peer, d);
        }
    }

    records
}

fn push_zone(records: &mut Vec<MetricRecord>, zones: &MetricPath, zone: &ServerZone, d: &ZoneDeltas) {
    let path = zones.dynamic(&zone.name);

    records.extend([
        MetricRecord::int(path.leaf("Requests per Interval"), d.requests),
        MetricRecord::int(path.leaf("Responses per Interval"), d.responses),
        MetricRecord::int(path.leaf("Discarded per Interval"), d.discarded),
        MetricRecord::int(path.leaf("Processing per Interval"), d.processing),
        MetricRecord::int(path.leaf("Sent Bytes per Interval"), d.sent),
        MetricRecord::int(path.leaf("Received Bytes per Interval"), d.received),
    ]);
    push_response_classes(records, &path, &d.responses_by_class);
}

fn push_peer(records: &mut Vec<MetricRecord>, upstream: &MetricPath, peer: &Peer, d: &PeerDeltas) {
    let path = upstream.dynamic(&peer.server);
    let health = path.child("Health Checks");

    records.extend([
        MetricRecord::text(
            path.leaf("Backup"),
            peer.backup.unwrap_or(false).to_string(),
        ),
        MetricRecord::text(
            path.leaf("State"),
            peer.state.as_deref().unwrap_or("unknown"),
        ),
        MetricRecord::int(path.leaf("Requests per Interval"), d.requests),
        MetricRecord::int(path.leaf("Weight"), gauge(peer.weight)),
        MetricRecord::int(path.leaf("Active Connections"), gauge(peer.active)),
        MetricRecord::int(path.leaf("Sent Bytes per Interval"), d.sent),
        MetricRecord::int(path.leaf("Received Bytes per Interval"), d.received),
        MetricRecord::int(path.leaf("Failures per Interval"), d.fails),
        MetricRecord::int(path.leaf("Unavailables per Interval"), d.unavail),
        MetricRecord::int(health.leaf("Checks per Interval"), d.health_checks.checks),
        MetricRecord::int(health.leaf("Failures per Interval"), d.health_checks.fails),
        MetricRecord::int(
            health.leaf("Unhealthy per Interval"),
            d.health_checks.unhealthy,
        ),
    ]);
    push_response_classes(records, &path, &d.responses_by_class);
}

fn push_response_classes(records: &mut Vec<MetricRecord>, parent: &MetricPath, by_class: &[i64; 5]) {
    let responses = parent.child("Responses");
    records.extend(
        RESPONSE_CLASSES
            .iter()
            .zip(by_class)
            .map(|(class, value)| {
                MetricRecord::int(responses.leaf(&format!("{class} per Interval")), *value)
            }),
    );
}

/// Current-value fields report 0 when absent.
fn gauge(value: Option<i64>) -> i64 {
    value.unwrap_or(0)
}
