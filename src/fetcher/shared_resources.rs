//! Shared HTTP client construction
//!
//! One `reqwest::Client` per process keeps connection pooling effective across
//! discovery and batch calls. Explicit timeouts prevent a hung request from
//! stalling the pump forever.

use reqwest::Client;
use std::time::Duration;

use super::{ApiError, ApiResult};

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Build the HTTP client with connect and overall request timeouts
///
/// Batch payloads can be large, so the request timeout comes from settings
/// rather than a short fixed value.
pub fn build_http_client(request_timeout: Duration) -> ApiResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(request_timeout)
        .user_agent(concat!("siem-log-pump/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ApiError::Transport(format!(
                "Failed to build HTTP client: {e}. Check system TLS configuration."
            ))
        })
}
