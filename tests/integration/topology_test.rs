//! Integration tests for topology and extension registration.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::FixtureServer;
use ngxmon_core::config::TopologyConfig;
use ngxmon_worker::topology::{EXTENSION_CONFIG_PATH, GRAPH_STORE_PATH};
use ngxmon_worker::{HttpTransport, TopologyRegistrar};

fn topology_config(server: &FixtureServer) -> TopologyConfig {
    TopologyConfig {
        enabled: true,
        host: server.addr.ip().to_string(),
        port: server.addr.port(),
        token: "apm-token".to_string(),
        agent_name: "EPAgent".to_string(),
        config_version: "1.3".to_string(),
        refresh_ms: 50,
        timeout_ms: Some(5_000),
        ..Default::default()
    }
}

fn registrar(server: &FixtureServer, source: &str) -> TopologyRegistrar {
    let config = topology_config(server);
    let transport = HttpTransport::new(&TopologyRegistrar::client_options(&config))
        .expect("Failed to build transport");
    TopologyRegistrar::new(Arc::new(transport), config, source.to_string())
}

#[tokio::test]
async fn test_registration_documents_reach_management_api() {
    let server = FixtureServer::start().await;
    let registrar = registrar(&server, "127.0.0.1");

    registrar.register_extension().await.expect("extension registration");
    registrar.register_vertex().await.expect("vertex registration");

    let received = server.received().await;
    assert_eq!(received.len(), 2);

    let extension = &received[0];
    assert_eq!(extension.path, EXTENSION_CONFIG_PATH);
    assert_eq!(extension.authorization.as_deref(), Some("Bearer apm-token"));
    assert_eq!(extension.content_type.as_deref(), Some("application/json"));
    assert_eq!(extension.body["version"], "1.3");

    let vertex = &received[1];
    assert_eq!(vertex.path, GRAPH_STORE_PATH);
    let attributes = &vertex.body["graph"]["vertices"][0]["attributes"];
    assert_eq!(attributes["hostname"], "127.0.0.1");
    assert_eq!(attributes["ipAddress"], "127.0.0.1");
    assert_eq!(attributes["agent"], "EPAgent");
}

#[tokio::test]
async fn test_run_refreshes_vertex_until_cancelled() {
    let server = FixtureServer::start().await;
    let registrar = registrar(&server, "localhost");
    let (tx, rx) = tokio::sync::watch::channel(false);

    let handle = tokio::spawn(async move { registrar.run(rx).await });
    tokio::time::sleep(Duration::from_millis(250)).await;
    tx.send(true).expect("send cancel");
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("registrar did not stop")
        .expect("registrar panicked");

    let received = server.received().await;
    let extensions = received
        .iter()
        .filter(|r| r.path == EXTENSION_CONFIG_PATH)
        .count();
    let vertices = received.iter().filter(|r| r.path == GRAPH_STORE_PATH).count();
    assert_eq!(extensions, 1);
    assert!(vertices >= 2, "expected vertex refreshes, got {vertices}");
}

#[tokio::test]
async fn test_unreachable_management_api_is_reported() {
    let server = FixtureServer::start().await;
    let mut config = topology_config(&server);
    config.port = 1;
    let transport =
        HttpTransport::new(&TopologyRegistrar::client_options(&config)).expect("transport");
    let registrar = TopologyRegistrar::new(Arc::new(transport), config, "127.0.0.1".to_string());

    let err = registrar
        .register_vertex()
        .await
        .expect_err("connection should be refused");
    assert_eq!(err.kind, ngxmon_core::error::ErrorKind::Transport);
}
