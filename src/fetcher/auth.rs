//! Request signing for the log-export API
//!
//! Every authenticated call carries `x-mc-date`, `x-mc-req-id`, `x-mc-app-id`
//! and an `Authorization: MC <access key>:<signature>` header, where the
//! signature is base64(HMAC-SHA1(base64-decoded secret, "date:req-id:uri:app-key")).

use super::{ApiError, ApiResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Request date header
pub const DATE_HEADER: &str = "x-mc-date";
/// Request id header
pub const REQUEST_ID_HEADER: &str = "x-mc-req-id";
/// Application id header
pub const APP_ID_HEADER: &str = "x-mc-app-id";

/// API credentials for one account
#[derive(Clone)]
pub struct Credentials {
    /// Access key
    pub access_key: String,
    /// Base64-encoded secret key
    pub secret_key: String,
    /// Registered application id
    pub app_id: String,
    /// Registered application key
    pub app_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// Headers for one signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `x-mc-date` value
    pub date: String,
    /// `x-mc-req-id` value
    pub request_id: String,
    /// `Authorization` value
    pub authorization: String,
}

/// Date in the header format the API signs over: `Mon, 15 Jan 2024 10:30:00 UTC`
pub fn header_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
}

impl Credentials {
    /// Sign a request for `uri` with a fresh request id and the current time
    pub fn sign_now(&self, uri: &str) -> ApiResult<SignedHeaders> {
        let date = header_date(Utc::now());
        let request_id = uuid::Uuid::new_v4().to_string();
        self.sign(uri, date, request_id)
    }

    /// Sign a request for `uri` with an explicit date and request id
    pub fn sign(&self, uri: &str, date: String, request_id: String) -> ApiResult<SignedHeaders> {
        let key = STANDARD
            .decode(self.secret_key.trim())
            .map_err(|e| ApiError::Signing(format!("secret key is not valid base64: {e}")))?;
        let mut mac = HmacSha1::new_from_slice(&key)
            .map_err(|e| ApiError::Signing(e.to_string()))?;
        mac.update(format!("{date}:{request_id}:{uri}:{}", self.app_key).as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(SignedHeaders {
            authorization: format!("MC {}:{signature}", self.access_key),
            date,
            request_id,
        })
    }
}
