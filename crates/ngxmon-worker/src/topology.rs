//! Topology and extension registration with the management API.
//!
//! Two documents are sent: the extension configuration once at startup, and
//! the nginx graph vertex on a refresh timer. Neither affects polling; failures
//! are logged and retried at the next refresh.

use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Value, json};
use tokio::sync::watch;

use ngxmon_core::config::TopologyConfig;
use ngxmon_core::result::AppResult;
use ngxmon_core::traits::Transport;
use ngxmon_core::types::Endpoint;

use crate::http::ClientOptions;

/// Path of the graph store endpoint.
pub const GRAPH_STORE_PATH: &str = "/apm/appmap/ats/graph/store";
/// Path of the extension configuration endpoint.
pub const EXTENSION_CONFIG_PATH: &str = "/apm/appmap/ats/extension/configure";

const SOURCE_ID: &str = "ca-apm-fieldpack-nginx";

/// Registers the monitored nginx instance with the management API.
#[derive(Debug)]
pub struct TopologyRegistrar {
    /// Outbound transport (proxy-aware).
    transport: Arc<dyn Transport>,
    /// Registration settings.
    config: TopologyConfig,
    /// Monitored host name; also the metric source.
    source: String,
}

impl TopologyRegistrar {
    /// Create a registrar.
    pub fn new(transport: Arc<dyn Transport>, config: TopologyConfig, source: String) -> Self {
        Self {
            transport,
            config,
            source,
        }
    }

    /// Client options for a transport dedicated to the management API.
    ///
    /// Both proxy kinds map onto the client's proxy support, which sends
    /// `http` targets in absolute form and tunnels `https` targets.
    pub fn client_options(config: &TopologyConfig) -> ClientOptions {
        ClientOptions {
            timeout: config.timeout(),
            accept_invalid_certs: !config.strict_ssl,
            proxy: config.proxy.url(),
        }
    }

    /// POST the extension configuration document.
    pub async fn register_extension(&self) -> AppResult<()> {
        let document = extension_document(&self.config.config_version);
        self.post(EXTENSION_CONFIG_PATH, &document).await?;
        tracing::info!(
            version = %self.config.config_version,
            "Registered nginx extension configuration"
        );
        Ok(())
    }

    /// Resolve the source host and POST the graph vertex document.
    pub async fn register_vertex(&self) -> AppResult<()> {
        let ip = resolve_ip(&self.source).await;
        let document = vertex_document(&self.source, &ip, &self.config.agent_name);
        self.post(GRAPH_STORE_PATH, &document).await?;
        tracing::info!(host = %self.source, %ip, "Registered nginx topology vertex");
        Ok(())
    }

    /// Register the extension once, then refresh the vertex every
    /// `refresh_ms` until `cancel` becomes `true` or its sender is dropped.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        if let Err(e) = self.register_extension().await {
            tracing::error!("Failed to register extension configuration: {}", e);
        }

        let refresh = self.config.refresh_interval();
        loop {
            if let Err(e) = self.register_vertex().await {
                tracing::error!("Failed to register topology vertex: {}", e);
            }

            tokio::select! {
                changed = cancel.changed() => {
                    // A dropped sender also means shutdown.
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Topology registrar shutting down");
                        break;
                    }
                }
                _ = tokio::time::sleep(refresh) => {}
            }
        }
    }

    async fn post(&self, path: &str, document: &Value) -> AppResult<()> {
        let endpoint = Endpoint::new(format!("{}{}", self.config.base_url(), path))
            .with_bearer(self.config.token.clone());
        let payload = Bytes::from(serde_json::to_vec(document)?);
        self.transport.send(&endpoint, payload).await
    }
}

/// Resolve `host` to an IP address, falling back to `host` itself.
pub async fn resolve_ip(host: &str) -> String {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.to_string();
    }

    match tokio::net::lookup_host((host, 0)).await {
        Ok(mut addrs) => addrs
            .next()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| host.to_string()),
        Err(e) => {
            tracing::warn!(%host, "DNS lookup failed, reporting host name as address: {}", e);
            host.to_string()
        }
    }
}

/// The graph vertex describing this nginx instance.
pub fn vertex_document(host: &str, ip: &str, agent_name: &str) -> Value {
    json!({
        "graph": {
            "vertices": [{
                "id": format!("ATC:nginx:{host}"),
                "layer": "ATC",
                "attributes": {
                    "name": format!("NGINX-{host}"),
                    "type": "nginx",
                    "hostname": host,
                    "ipAddress": ip,
                    "agent": agent_name,
                    "TTPlugin.sourceID": SOURCE_ID,
                    "TTPlugin.correlation.proxy.1.source.host": host,
                    "TTPlugin.correlation.proxy.1.source.ip": ip,
                    "TTPlugin.correlation.proxy.1.source.port": "80"
                }
            }],
            "edges": []
        }
    })
}

/// The extension configuration describing which metrics to surface.
pub fn extension_document(version: &str) -> Value {
    let specifier = |format: &str, metric: &str| {
        json!({
            "metricSpecifier": { "format": format, "type": "EXACT" },
            "agentSpecifier": { "format": ".*|.*|.*", "type": "REGEX" },
            "section": "nginx Metrics",
            "metricNames": [metric],
            "filter": {}
        })
    };

    json!({
        "id": "nginx",
        "version": version,
        "metricSpecifiers": {
            "nginx": [
                specifier("nginx|<hostname>", "Average Requests per Connection"),
                specifier("nginx|<hostname>", "Requests per Interval"),
                specifier("nginx|<hostname>|Connections", "Active"),
                specifier("nginx|<hostname>|Connections", "Idle"),
            ]
        },
        "metricRootSpecifiers": {
            "nginx": [{ "rootSpecifier": "<agent>|nginx|<hostname>", "nextLevelRegex": null }]
        },
        "alertMappings": {
            "nginx": ["nginx|<hostname>"]
        }
    })
}
