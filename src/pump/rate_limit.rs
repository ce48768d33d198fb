//! Rate-limit governor for HTTP 429 responses
//!
//! The reset header is a millisecond value. It is reduced modulo one minute and
//! scaled by [`RATE_LIMIT_MULTIPLIER`]. This is a coarse, generous backoff, not
//! the server's actual reset deadline: a reset of 90 000 ms yields 600 s.

use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::warn;

use super::config::{RATE_LIMIT_MULTIPLIER, RATE_LIMIT_WINDOW_MS};
use crate::fetcher::RATE_LIMIT_RESET_HEADER;

/// Computes the pause after a 429
#[derive(Debug, Clone)]
pub struct RateLimitGovernor {
    fallback: Duration,
}

impl RateLimitGovernor {
    /// Governor that pauses for `fallback` when the reset header is missing or unreadable
    pub fn new(fallback: Duration) -> Self {
        Self { fallback }
    }

    /// Backoff for a rate-limited response
    pub fn compute_backoff(&self, headers: &HeaderMap) -> Duration {
        let raw = headers
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok());

        match raw.and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(reset_ms) => backoff_from_reset_ms(reset_ms),
            None => {
                warn!(
                    header = RATE_LIMIT_RESET_HEADER,
                    value = ?raw,
                    fallback_secs = self.fallback.as_secs(),
                    "Rate-limit reset header missing or invalid, using fallback backoff"
                );
                self.fallback
            }
        }
    }
}

/// `(reset_ms / 1000 % 60) * 20` seconds, kept at millisecond precision
pub fn backoff_from_reset_ms(reset_ms: u64) -> Duration {
    Duration::from_millis((reset_ms % RATE_LIMIT_WINDOW_MS) * RATE_LIMIT_MULTIPLIER)
}
