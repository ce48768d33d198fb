//! Pump timing constants

use std::time::Duration;

/// Pause after the API reports no more logs.
/// New logs keep arriving, so an exhausted stream is re-polled rather than abandoned.
pub const IDLE_BACKOFF: Duration = Duration::from_secs(60);

/// Multiplier applied to the rate-limit reset offset
pub const RATE_LIMIT_MULTIPLIER: u64 = 20;

/// Window the reset value is reduced into (milliseconds)
pub const RATE_LIMIT_WINDOW_MS: u64 = 60_000;

/// Pause before the supervisor restarts discovery after the loop stopped
pub const RESTART_DELAY: Duration = Duration::from_secs(60);

/// Default stream (event type) pulled by the pump
pub const DEFAULT_STREAM_TYPE: &str = "MTA";
