//! Poll scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fixed-interval poll settings.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay in milliseconds between the end of one cycle and the start of the next.
    #[serde(default = "default_interval")]
    #[validate(range(min = 1, message = "poller.interval_ms must be positive"))]
    pub interval_ms: u64,
}

impl PollerConfig {
    /// The delay between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    15_000
}
