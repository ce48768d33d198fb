//! Batch response classification

use reqwest::header::HeaderMap;

use crate::fetcher::BatchResponse;

/// Media type of an empty batch
pub const NO_LOGS_MEDIA_TYPE: &str = "application/json";

/// Media type of a log file payload
pub const PAYLOAD_MEDIA_TYPE: &str = "application/octet-stream";

/// What a batch response carries, decided by its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// JSON body: the stream is exhausted for now
    NoMoreLogs,
    /// Binary body: a log file to persist
    Payload,
    /// Anything else
    Unexpected {
        /// Content type as received, if any
        content_type: Option<String>,
    },
}

impl ResponseClass {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            ResponseClass::NoMoreLogs => "no_more_logs",
            ResponseClass::Payload => "payload",
            ResponseClass::Unexpected { .. } => "unexpected",
        }
    }
}

/// HTTP 429
pub fn is_rate_limited(status: u16) -> bool {
    status == 429
}

/// Classify a response by its media type
pub fn classify(response: &BatchResponse) -> ResponseClass {
    match response.media_type().as_deref() {
        Some(NO_LOGS_MEDIA_TYPE) => ResponseClass::NoMoreLogs,
        Some(PAYLOAD_MEDIA_TYPE) => ResponseClass::Payload,
        _ => ResponseClass::Unexpected {
            content_type: response
                .header(reqwest::header::CONTENT_TYPE.as_str())
                .map(str::to_string),
        },
    }
}

/// `name: value` for every header, for diagnostics
pub fn describe_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                name,
                value.to_str().unwrap_or("<non-ascii value>")
            )
        })
        .collect()
}
