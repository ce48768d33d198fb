//! Immutable per-run stream configuration

use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;
use std::time::Duration;

use super::config::{DEFAULT_STREAM_TYPE, IDLE_BACKOFF, RESTART_DELAY};

/// Everything the pump needs to know about the stream it drives
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct StreamContext {
    /// Event type requested from the API, e.g. `MTA`
    pub stream_type: String,
    /// Account used for base URL discovery
    pub account: String,
    /// Directory holding the checkpoint file
    pub checkpoint_dir: PathBuf,
    /// Root of the date-partitioned artifact tree
    pub log_root: PathBuf,
    /// Request compressed archives
    pub compression: bool,
    /// Forward artifact lines to syslog
    pub syslog_enabled: bool,
    /// Offset used to pin artifact modification times
    pub utc_offset: FixedOffset,
    /// Pause after a "no more logs" response
    pub idle_backoff: Duration,
    /// Rerun discovery + loop after the loop stops
    pub restart_on_stop: bool,
    /// Pause before such a restart
    pub restart_delay: Duration,
}

impl StreamContext {
    /// Context with default stream, timings and UTC partition times
    pub fn new(
        account: impl Into<String>,
        checkpoint_dir: impl Into<PathBuf>,
        log_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stream_type: DEFAULT_STREAM_TYPE.to_string(),
            account: account.into(),
            checkpoint_dir: checkpoint_dir.into(),
            log_root: log_root.into(),
            compression: false,
            syslog_enabled: false,
            utc_offset: Utc.fix(),
            idle_backoff: IDLE_BACKOFF,
            restart_on_stop: false,
            restart_delay: RESTART_DELAY,
        }
    }

    /// Request compressed archives
    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Enable or disable syslog forwarding
    pub fn with_syslog(mut self, enabled: bool) -> Self {
        self.syslog_enabled = enabled;
        self
    }

    /// Set the stream type
    pub fn with_stream_type(mut self, stream_type: impl Into<String>) -> Self {
        self.stream_type = stream_type.into();
        self
    }

    /// Set the offset used for artifact modification times
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Override the idle backoff
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    /// Configure supervisor restarts
    pub fn with_restart(mut self, restart_on_stop: bool, delay: Duration) -> Self {
        self.restart_on_stop = restart_on_stop;
        self.restart_delay = delay;
        self
    }
}

