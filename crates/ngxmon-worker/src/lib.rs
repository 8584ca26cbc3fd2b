//! Poll loop and network collaborators for ngxmon.
//!
//! This crate provides:
//! - A poll runner that executes one fetch → process → forward cycle per interval
//! - An HTTP status source for the nginx status endpoint
//! - An HTTP transport (with optional forward proxy) for outbound POSTs
//! - A metric forwarder for the EPAgent metric feed
//! - A topology registrar for the management API

pub mod error;
pub mod forwarder;
pub mod http;
pub mod runner;
pub mod source;
pub mod topology;
pub mod transport;

pub use error::PollError;
pub use forwarder::MetricForwarder;
pub use runner::PollRunner;
pub use source::HttpStatusSource;
pub use topology::TopologyRegistrar;
pub use transport::HttpTransport;
