//! HTTP implementation of [`LogExportApi`]
//!
//! Discovery resolves the regional API host for the account; batch calls are
//! signed POSTs whose body is streamed back to the caller untouched.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, warn};

use super::auth::{header_date, APP_ID_HEADER, DATE_HEADER, REQUEST_ID_HEADER};
use super::{ApiError, ApiResult, BatchRequest, BatchResponse, Credentials, LogExportApi};
use crate::metrics;

/// Default global discovery endpoint host
pub const DEFAULT_DISCOVERY_URL: &str = "https://api.mimecast.com";

/// Discovery endpoint path
pub const DISCOVER_URI: &str = "/api/login/discover-authentication";

/// SIEM log batch endpoint path
pub const SIEM_LOGS_URI: &str = "/api/audit/get-siem-logs";

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(default)]
    data: Vec<DiscoverEntry>,
}

#[derive(Debug, Deserialize)]
struct DiscoverEntry {
    region: Option<DiscoverRegion>,
}

#[derive(Debug, Deserialize)]
struct DiscoverRegion {
    api: String,
}

/// Signed HTTP client for the log-export API
pub struct MimecastHttpClient {
    client: Client,
    discovery_url: String,
    credentials: Credentials,
}

impl MimecastHttpClient {
    /// Create a client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (see [`super::shared_resources::build_http_client`])
    /// * `discovery_url` - Global discovery host, e.g. [`DEFAULT_DISCOVERY_URL`]
    /// * `credentials` - Account credentials used to sign batch requests
    pub fn new(client: Client, discovery_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            discovery_url: discovery_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn app_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(APP_ID_HEADER, &self.credentials.app_id)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, application/octet-stream")
    }
}

#[async_trait]
impl LogExportApi for MimecastHttpClient {
    async fn discover_base_url(&self, account: &str) -> ApiResult<String> {
        let url = format!("{}{}", self.discovery_url, DISCOVER_URI);
        let body = serde_json::json!({ "data": [{ "emailAddress": account }] });
        debug!(url = %url, account, "Discovering API base URL");

        let response = self
            .app_headers(self.client.post(&url))
            .header(DATE_HEADER, header_date(chrono::Utc::now()))
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Discovery(format!("HTTP {status} from {url}")));
        }

        let parsed: DiscoverResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Discovery(format!("unreadable discovery response: {e}")))?;

        parsed
            .data
            .into_iter()
            .find_map(|entry| entry.region)
            .map(|region| region.api.trim_end_matches('/').to_string())
            .filter(|api| !api.is_empty())
            .ok_or_else(|| ApiError::Discovery(format!("no region returned for {account}")))
    }

    async fn post_batch(&self, base_url: &str, request: &BatchRequest) -> ApiResult<BatchResponse> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), SIEM_LOGS_URI);
        let signed = self.credentials.sign_now(SIEM_LOGS_URI)?;
        debug!(
            url = %url,
            stream = %request.stream_type,
            has_token = request.token.is_some(),
            request_id = %signed.request_id,
            "Requesting log batch"
        );

        let started = Instant::now();
        let response = self
            .app_headers(self.client.post(&url))
            .header(DATE_HEADER, &signed.date)
            .header(REQUEST_ID_HEADER, &signed.request_id)
            .header(reqwest::header::AUTHORIZATION, &signed.authorization)
            .json(&request.to_body())
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                metrics::record_request(started.elapsed(), None);
                return Err(ApiError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        metrics::record_request(started.elapsed(), Some(status.as_u16()));

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), "Credentials rejected by log-export API");
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ApiError::Transport(e.to_string())));

        Ok(BatchResponse {
            status: status.as_u16(),
            headers,
            body: Box::pin(body),
        })
    }
}
