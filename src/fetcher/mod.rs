//! Remote log-export API
//!
//! The pump talks to the API only through [`LogExportApi`], so tests can swap
//! in scripted responses and the HTTP implementation stays at the edge.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::json;
use std::pin::Pin;

pub mod auth;
pub mod mimecast_http;
pub mod shared_resources;

pub use auth::Credentials;
pub use mimecast_http::MimecastHttpClient;

/// Header carrying the next resumption token
pub const TOKEN_HEADER: &str = "mc-siem-token";

/// Header carrying the rate-limit reset value (milliseconds)
pub const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure; no response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials rejected by the API
    #[error("unauthorized: HTTP {status}")]
    Unauthorized {
        /// HTTP status returned
        status: u16,
    },

    /// Base URL discovery failed
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Request could not be signed
    #[error("signing error: {0}")]
    Signing(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Chunked response body
pub type BodyStream = Pin<Box<dyn Stream<Item = ApiResult<Bytes>> + Send>>;

/// One batch request for a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Stream (event type) identifier, e.g. `MTA`
    pub stream_type: String,
    /// Ask for a compressed archive
    pub compress: bool,
    /// Resumption token; absent means start of available history
    pub token: Option<String>,
}

impl BatchRequest {
    /// JSON request body: `{"data":[{"type":..,"compress":..,"token"?:..}]}`
    pub fn to_body(&self) -> serde_json::Value {
        let mut entry = json!({
            "type": self.stream_type,
            "compress": self.compress,
        });
        if let Some(token) = &self.token {
            entry["token"] = json!(token);
        }
        json!({ "data": [entry] })
    }
}

/// Raw response to a batch request, body not yet consumed
pub struct BatchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: BodyStream,
}

impl BatchResponse {
    /// Build a response from an in-memory body
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            headers,
            body: Box::pin(stream::once(async move { Ok(body) })),
        }
    }

    /// Header value as text, if present and valid
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Media type without parameters, lowercased (`application/json; charset=utf-8` -> `application/json`)
    pub fn media_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
    }

    /// Drain the body into memory
    pub async fn into_bytes(mut self) -> ApiResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl std::fmt::Debug for BatchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Remote log-export API consumed by the pump
#[async_trait]
pub trait LogExportApi: Send + Sync {
    /// Resolve the regional API base URL for an account
    async fn discover_base_url(&self, account: &str) -> ApiResult<String>;

    /// Request the next batch of a stream
    ///
    /// `Err` means no usable response was received (connectivity or auth);
    /// every other outcome, including HTTP 429, comes back as `Ok`.
    async fn post_batch(&self, base_url: &str, request: &BatchRequest) -> ApiResult<BatchResponse>;
}
