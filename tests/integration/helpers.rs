//! Shared test helpers for integration tests.
//!
//! [`FixtureServer`] is an in-process axum server that plays both sides of a
//! deployment: it serves canned nginx status pages and records every POST
//! made to the metric feed or the management API.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::Mutex;

use ngxmon_core::config::{AgentConfig, NginxConfig};

/// Path the fixture serves status pages on.
pub const STATUS_PATH: &str = "/nginx_status";
/// Path the fixture accepts metric feed POSTs on.
pub const FEED_PATH: &str = "/apm/metricFeed";

/// One canned status page response.
#[derive(Debug, Clone)]
pub struct CannedStatus {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl CannedStatus {
    /// 200 with a `text/plain` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some("text/plain"),
            body: body.into(),
        }
    }

    /// 200 with an `application/json` body.
    pub fn json(body: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some("application/json; charset=utf-8"),
            body: body.to_string(),
        }
    }

    /// A bodiless response with the given status.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }
}

/// A POST received by the fixture.
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct FixtureState {
    /// Expected `Authorization` header for status requests
    status_auth: Option<String>,
    statuses: Mutex<VecDeque<CannedStatus>>,
    received: Mutex<Vec<Received>>,
}

/// Test fixture server
pub struct FixtureServer {
    pub addr: SocketAddr,
    state: Arc<FixtureState>,
}

impl FixtureServer {
    /// Start a fixture without status authentication.
    pub async fn start() -> Self {
        Self::start_with_auth(None).await
    }

    /// Start a fixture whose status page requires `authorization`.
    pub async fn start_with_auth(authorization: Option<&str>) -> Self {
        let state = Arc::new(FixtureState {
            status_auth: authorization.map(str::to_string),
            ..Default::default()
        });

        let router = Router::new()
            .route(STATUS_PATH, get(status_page))
            .route(FEED_PATH, post(record))
            .route(ngxmon_worker::topology::GRAPH_STORE_PATH, post(record))
            .route(ngxmon_worker::topology::EXTENSION_CONFIG_PATH, post(record))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fixture listener");
        let addr = listener.local_addr().expect("Failed to read fixture address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fixture server failed");
        });

        Self { addr, state }
    }

    /// Absolute URL for `path` on this fixture.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Queue a status page response.
    pub async fn push_status(&self, status: CannedStatus) {
        self.state.statuses.lock().await.push_back(status);
    }

    /// Every POST received so far.
    pub async fn received(&self) -> Vec<Received> {
        self.state.received.lock().await.clone()
    }

    /// `nginx` config section pointing at this fixture.
    pub fn nginx_config(&self) -> NginxConfig {
        NginxConfig {
            url: self.url(STATUS_PATH),
            username: None,
            password: None,
            strict_ssl: true,
            timeout_ms: Some(5_000),
        }
    }

    /// `agent` config section pointing at this fixture.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            timeout_ms: Some(5_000),
            ..Default::default()
        }
    }
}

async fn status_page(State(state): State<Arc<FixtureState>>, headers: HeaderMap) -> Response {
    if let Some(expected) = &state.status_auth {
        let given = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let Some(canned) = state.statuses.lock().await.pop_front() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match canned.content_type {
        Some(content_type) => (
            canned.status,
            [(header::CONTENT_TYPE, content_type)],
            canned.body,
        )
            .into_response(),
        None => (canned.status, canned.body).into_response(),
    }
}

async fn record(
    State(state): State<Arc<FixtureState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let Ok(body) = serde_json::from_slice(&body) else {
        return StatusCode::BAD_REQUEST;
    };

    state.received.lock().await.push(Received {
        path: uri.path().to_string(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    });
    StatusCode::OK
}

/// A `stub_status` page with the given counters.
pub fn stub_status(active: i64, accepts: i64, handled: i64, requests: i64) -> String {
    format!(
        "Active connections: {active} \nserver accepts handled requests\n {accepts} {handled} {requests} \nReading: 0 Writing: 1 Waiting: {} \n",
        (active - 1).max(0)
    )
}

/// Integer value of metric `name` in a forwarded batch.
pub fn metric(batch: &Value, name: &str) -> Value {
    batch["metrics"]
        .as_array()
        .expect("metrics array")
        .iter()
        .find(|m| m["name"] == name)
        .map(|m| m["value"].clone())
        .unwrap_or_else(|| panic!("metric '{name}' not forwarded"))
}
