//! Integration tests for the fetch → process → forward cycle over HTTP.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{CannedStatus, FEED_PATH, FixtureServer, metric, stub_status};
use ngxmon_core::error::ErrorKind;
use ngxmon_core::traits::StatusSource;
use ngxmon_core::types::{Endpoint, MetricBatch};
use ngxmon_stats::StatsPipeline;
use ngxmon_worker::http::ClientOptions;
use ngxmon_worker::{HttpStatusSource, HttpTransport, MetricForwarder, PollRunner};

fn runner(server: &FixtureServer) -> PollRunner {
    let source = HttpStatusSource::new(&server.nginx_config()).expect("Failed to build source");
    let transport = HttpTransport::new(&ClientOptions::default()).expect("Failed to build transport");
    let forwarder = MetricForwarder::from_config(Arc::new(transport), &server.agent_config());

    PollRunner::new(
        Arc::new(source),
        StatsPipeline::new("web01"),
        Some(Arc::new(forwarder)),
        Duration::from_millis(50),
    )
}

async fn run_cycle(runner: &mut PollRunner) {
    runner
        .cycle()
        .await
        .expect("Cycle should forward")
        .await
        .expect("Forward task panicked");
}

fn extended(requests: i64, zone_requests: i64, peer_requests: i64, peer_state: &str) -> serde_json::Value {
    json!({
        "connections": {"active": 3, "idle": 7, "accepted": 500, "dropped": 0},
        "requests": {"total": requests, "current": 3},
        "ssl": {"handshakes": requests / 2, "handshakes_failed": 1, "session_reuses": 4},
        "server_zones": {
            "www:443": {
                "processing": 1,
                "requests": zone_requests,
                "responses": {"1xx": 0, "2xx": zone_requests - 2, "3xx": 0, "4xx": 2, "5xx": 0, "total": zone_requests},
                "discarded": 0,
                "received": zone_requests * 100,
                "sent": zone_requests * 1000
            }
        },
        "upstreams": {
            "backend": {
                "peers": [
                    {
                        "server": "10.0.0.1:8080",
                        "backup": false,
                        "weight": 5,
                        "state": peer_state,
                        "active": 1,
                        "requests": peer_requests,
                        "responses": {"1xx": 0, "2xx": peer_requests, "3xx": 0, "4xx": 0, "5xx": 0, "total": peer_requests},
                        "sent": 10,
                        "received": 20,
                        "fails": 0,
                        "unavail": 0,
                        "health_checks": {"checks": 3, "fails": 0, "unhealthy": 0}
                    }
                ]
            }
        }
    })
}

#[tokio::test]
async fn test_stub_status_cycles_forward_deltas() {
    let server = FixtureServer::start().await;
    server.push_status(CannedStatus::text(stub_status(2, 112, 112, 121))).await;
    server.push_status(CannedStatus::text(stub_status(3, 130, 130, 150))).await;

    let mut runner = runner(&server);
    run_cycle(&mut runner).await;
    run_cycle(&mut runner).await;

    let received = server.received().await;
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|r| r.path == FEED_PATH));
    assert_eq!(received[0].content_type.as_deref(), Some("application/json"));

    let first = &received[0].body;
    assert_eq!(first["metrics"].as_array().expect("metrics").len(), 8);
    assert_eq!(metric(first, "nginx|web01:Requests per Interval"), 0);
    assert_eq!(metric(first, "nginx|web01|Connections:Active"), 2);

    let second = &received[1].body;
    assert_eq!(metric(second, "nginx|web01|Connections:Handled Connections"), 18);
    assert_eq!(metric(second, "nginx|web01:Requests per Interval"), 29);
    assert_eq!(metric(second, "nginx|web01:Average Requests per Connection"), 2);
    assert_eq!(metric(second, "nginx|web01|Connections:Active"), 3);
    assert_eq!(second["metrics"][0]["type"], "IntAverage");
}

#[tokio::test]
async fn test_extended_cycles_forward_zone_and_peer_deltas() {
    let server = FixtureServer::start().await;
    server.push_status(CannedStatus::json(&extended(1000, 400, 200, "up"))).await;
    server.push_status(CannedStatus::json(&extended(1060, 430, 215, "down"))).await;

    let mut runner = runner(&server);
    run_cycle(&mut runner).await;
    run_cycle(&mut runner).await;

    let received = server.received().await;
    assert_eq!(received.len(), 2);

    let first = &received[0].body;
    assert_eq!(metric(first, "nginx|web01|Server Zone|www_443:Requests per Interval"), 0);
    assert_eq!(metric(first, "nginx|web01|Upstreams|backend|10.0.0.1_8080:State"), "up");

    let second = &received[1].body;
    assert_eq!(metric(second, "nginx|web01:Requests per Interval"), 60);
    assert_eq!(metric(second, "nginx|web01|Connections:Idle"), 7);
    assert_eq!(metric(second, "nginx|web01|SSL:Handshakes per Interval"), 30);
    assert_eq!(metric(second, "nginx|web01|Server Zone|www_443:Requests per Interval"), 30);
    assert_eq!(
        metric(second, "nginx|web01|Server Zone|www_443:Sent Bytes per Interval"),
        30_000
    );
    assert_eq!(
        metric(second, "nginx|web01|Server Zone|www_443|Responses:2xx per Interval"),
        30
    );
    assert_eq!(
        metric(second, "nginx|web01|Upstreams|backend|10.0.0.1_8080:Requests per Interval"),
        15
    );
    assert_eq!(metric(second, "nginx|web01|Upstreams|backend|10.0.0.1_8080:Weight"), 5);
    assert_eq!(metric(second, "nginx|web01|Upstreams|backend|10.0.0.1_8080:State"), "down");
    assert_eq!(metric(second, "nginx|web01|Upstreams|backend|10.0.0.1_8080:Backup"), "false");
}

#[tokio::test]
async fn test_basic_auth_credentials_are_passed_through() {
    let server = FixtureServer::start_with_auth(Some("Basic bW9uaXRvcjpzZWNyZXQ=")).await;
    server.push_status(CannedStatus::text(stub_status(1, 5, 5, 9))).await;

    let mut config = server.nginx_config();
    let unauthenticated = HttpStatusSource::new(&config).expect("source");
    let err = unauthenticated.fetch().await.expect_err("401 without credentials");
    assert_eq!(err.kind, ErrorKind::Authentication);

    config.username = Some("monitor".to_string());
    config.password = Some("secret".to_string());
    let source = HttpStatusSource::new(&config).expect("source");
    let response = source.fetch().await.expect("authorized fetch");
    assert!(response.body.starts_with("Active connections: 1"));
    assert_eq!(response.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_fetch_failures_abort_cycle_and_keep_snapshot() {
    let server = FixtureServer::start().await;
    server.push_status(CannedStatus::text(stub_status(1, 100, 100, 100))).await;
    server.push_status(CannedStatus::status(StatusCode::INTERNAL_SERVER_ERROR)).await;
    server.push_status(CannedStatus::text("")).await;
    server.push_status(CannedStatus::json(&json!([1, 2, 3]))).await;
    server.push_status(CannedStatus::text(stub_status(1, 110, 110, 125))).await;

    let mut runner = runner(&server);
    run_cycle(&mut runner).await;

    let err = runner.poll_once().await.expect_err("500 should fail");
    assert_eq!(err.kind(), ErrorKind::Fetch);
    let err = runner.poll_once().await.expect_err("empty body should fail");
    assert_eq!(err.kind(), ErrorKind::EmptyBody);
    let err = runner.poll_once().await.expect_err("array should fail to parse");
    assert_eq!(err.kind(), ErrorKind::Parse);

    run_cycle(&mut runner).await;

    let received = server.received().await;
    assert_eq!(received.len(), 2);
    assert_eq!(
        metric(&received[1].body, "nginx|web01|Connections:Handled Connections"),
        10
    );
    assert_eq!(metric(&received[1].body, "nginx|web01:Requests per Interval"), 25);
}

#[tokio::test]
async fn test_unreachable_status_endpoint_is_fetch_error() {
    let server = FixtureServer::start().await;
    let mut config = server.nginx_config();
    config.url = server.url("/missing");

    let source = HttpStatusSource::new(&config).expect("source");
    let err = source.fetch().await.expect_err("404 should fail");
    assert_eq!(err.kind, ErrorKind::Fetch);
    assert!(err.message.contains("recheck the URL"));
}

#[tokio::test]
async fn test_transport_rejects_non_success_status() {
    let server = FixtureServer::start().await;
    let transport = HttpTransport::new(&ClientOptions::default()).expect("transport");
    let forwarder = MetricForwarder::new(Arc::new(transport), Endpoint::new(server.url("/nowhere")));

    let err = forwarder
        .forward(&MetricBatch::default())
        .await
        .expect_err("404 should fail");
    assert_eq!(err.kind, ErrorKind::Transport);
}

#[tokio::test]
async fn test_run_loop_polls_until_cancelled() {
    let server = FixtureServer::start().await;
    for i in 0..20 {
        server
            .push_status(CannedStatus::text(stub_status(1, 10 * i, 10 * i, 20 * i)))
            .await;
    }

    let runner = runner(&server);
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(runner.run(rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(true).expect("send cancel");
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("runner did not stop")
        .expect("runner panicked");

    let received = server.received().await;
    assert!(received.len() >= 2, "expected several cycles, got {}", received.len());
    assert_eq!(
        metric(&received[1].body, "nginx|web01:Requests per Interval"),
        20
    );
}
