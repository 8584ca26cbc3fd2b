//! Core traits defined in `ngxmon-core` and implemented by other crates.

pub mod status_source;
pub mod transport;

pub use status_source::{StatusResponse, StatusSource};
pub use transport::Transport;
