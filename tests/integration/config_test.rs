//! Integration tests for configuration loading.

use std::io::Write;

use ngxmon_core::config::{AppConfig, ProxyKind};
use ngxmon_core::error::ErrorKind;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_load_explicit_file() {
    let file = write_config(
        r#"
        source = "edge-1"

        [nginx]
        url = "https://edge-1.internal/status"
        username = "monitor"
        password = "secret"
        strict_ssl = false
        timeout_ms = 2500

        [poller]
        interval_ms = 30000

        [agent]
        host = "epagent.internal"
        port = 9080

        [topology]
        enabled = true
        host = "apm.internal"
        token = "abc"
        connection = "https"

        [topology.proxy]
        kind = "https"
        host = "proxy.internal"
        port = 3128
        "#,
    );

    let config = AppConfig::load("integration-test", file.path().to_str())
        .expect("Failed to load config");

    assert_eq!(config.resolved_source(), "edge-1");
    assert_eq!(config.nginx.url, "https://edge-1.internal/status");
    assert_eq!(config.nginx.username.as_deref(), Some("monitor"));
    assert!(!config.nginx.strict_ssl);
    assert_eq!(config.nginx.timeout_ms, Some(2500));
    assert_eq!(config.poller.interval_ms, 30_000);
    assert_eq!(config.agent.feed_url(), "http://epagent.internal:9080/apm/metricFeed");
    assert_eq!(config.topology.base_url(), "https://apm.internal:8081");
    assert_eq!(config.topology.proxy.kind, ProxyKind::Https);
    assert_eq!(
        config.topology.proxy.url().as_deref(),
        Some("http://proxy.internal:3128")
    );
}

#[test]
fn test_missing_explicit_file_is_error() {
    let err = AppConfig::load("integration-test", Some("/nonexistent/ngxmon.toml"))
        .expect_err("missing file should fail");
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[test]
fn test_invalid_source_is_rejected() {
    let file = write_config(
        r#"
        source = "bad|name"

        [nginx]
        url = "http://localhost/nginx_status"
        "#,
    );

    let err = AppConfig::load("integration-test", file.path().to_str())
        .expect_err("separator in source should fail");
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn test_enabled_topology_requires_token() {
    let file = write_config(
        r#"
        [nginx]
        url = "http://localhost/nginx_status"

        [topology]
        enabled = true
        host = "apm.internal"
        "#,
    );

    let err = AppConfig::load("integration-test", file.path().to_str())
        .expect_err("token is required");
    assert_eq!(err.kind, ErrorKind::Validation);
}
