//! Errors raised while interpreting a status page.

use ngxmon_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Failure to turn a status body into a snapshot.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The body was labelled JSON but is not valid JSON.
    #[error("Status body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is valid JSON but not an object.
    #[error("Status body is a JSON {found}, expected an object")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The text body contained no recognisable status line.
    #[error("Status body contains no recognisable counters")]
    NoCounters,
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        let message = format!("Could not parse nginx statistics: {err}");
        AppError::with_source(ErrorKind::Parse, message, err)
    }
}
