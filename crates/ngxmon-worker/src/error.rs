//! Poll cycle errors.

use ngxmon_core::error::{AppError, ErrorKind};
use ngxmon_stats::StatsError;

/// Why a poll cycle was aborted.
///
/// Every variant is non-fatal: the runner logs it and schedules the next
/// cycle with the previous snapshot left in place.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The status page could not be fetched (transport failure, 401,
    /// unexpected status or empty body).
    #[error("{0}")]
    Source(#[from] AppError),

    /// The status page could not be interpreted.
    #[error("Could not parse nginx statistics: {0}")]
    Parse(#[from] StatsError),
}

impl PollError {
    /// The error category, for logging.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(err) => err.kind,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl From<PollError> for AppError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Source(err) => err,
            PollError::Parse(err) => err.into(),
        }
    }
}
