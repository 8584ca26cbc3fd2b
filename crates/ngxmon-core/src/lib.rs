//! # ngxmon-core
//!
//! Core crate for ngxmon. Contains the configuration schema, the transport
//! and status-source traits, the metric wire types sent to the monitoring
//! backend, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ngxmon crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
