//! Sleep hook for the pump
//!
//! Every pause the pump takes (rate-limit backoff, idle backoff, restart
//! delay) goes through a [`Pacer`], so tests can observe pauses without
//! waiting and shutdown can cut a pause short.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::shutdown::SharedShutdown;

/// Injectable pause
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Pause for `duration`. Returns `false` if the pause was cut short by shutdown.
    async fn pause(&self, duration: Duration) -> bool;
}

/// Real-time pacer that wakes early on shutdown
pub struct ShutdownAwarePacer {
    shutdown: SharedShutdown,
}

impl ShutdownAwarePacer {
    /// Create a pacer bound to `shutdown`
    pub fn new(shutdown: SharedShutdown) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl Pacer for ShutdownAwarePacer {
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.shutdown.is_shutdown_requested();
        }
        debug!(secs = duration.as_secs_f64(), "Pausing");
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.shutdown.is_shutdown_requested(),
            _ = self.shutdown.wait_for_shutdown() => false,
        }
    }
}
