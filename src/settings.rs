//! Configuration file loading
//!
//! Settings live in a TOML file with four sections:
//!
//! ```toml
//! [authentication]
//! email_address = "siem@example.com"
//! access_key = "..."
//! secret_key = "..."          # base64, as issued
//! app_id = "..."
//! app_key = "..."
//!
//! [logging]
//! log_file_path = "/var/log/siem"
//! checkpoint_dir = "/var/lib/siem-log-pump"
//! use_compression_where_possible = true
//! partition_utc_offset = "+00:00"
//!
//! [syslog]
//! syslog_output = true
//! syslog_server = "collector.internal"
//! syslog_port = 514
//!
//! [pump]
//! idle_backoff_secs = 60
//! restart_on_stop = true
//! ```

use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::fetcher::mimecast_http::DEFAULT_DISCOVERY_URL;
use crate::fetcher::Credentials;
use crate::pump::config::{DEFAULT_STREAM_TYPE, IDLE_BACKOFF, RESTART_DELAY};
use crate::pump::StreamContext;

/// Default request timeout; batch payloads can be large
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default syslog port
pub const DEFAULT_SYSLOG_PORT: u16 = 514;

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("failed to read settings file {path}: {reason}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying error
        reason: String,
    },

    /// Settings file is not valid TOML for this schema
    #[error("failed to parse settings: {0}")]
    Parse(String),

    /// A value is present but unusable
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Complete settings file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Account and API credentials
    pub authentication: AuthenticationSettings,
    /// Paths and stream options
    pub logging: LoggingSettings,
    /// Syslog output
    #[serde(default)]
    pub syslog: SyslogSettings,
    /// Pump timings
    #[serde(default)]
    pub pump: PumpSettings,
}

/// `[authentication]`
#[derive(Clone, Deserialize)]
pub struct AuthenticationSettings {
    /// Account used for base URL discovery
    pub email_address: String,
    /// API access key
    pub access_key: String,
    /// API secret key (base64)
    pub secret_key: String,
    /// Application id
    pub app_id: String,
    /// Application key
    pub app_key: String,
    /// Global discovery host
    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,
}

impl std::fmt::Debug for AuthenticationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationSettings")
            .field("email_address", &self.email_address)
            .field("access_key", &self.access_key)
            .field("app_id", &self.app_id)
            .field("discovery_url", &self.discovery_url)
            .finish_non_exhaustive()
    }
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Root of the date-partitioned artifact tree
    pub log_file_path: PathBuf,
    /// Checkpoint directory
    pub checkpoint_dir: PathBuf,
    /// Request compressed archives
    #[serde(default)]
    pub use_compression_where_possible: bool,
    /// Stream (event type)
    #[serde(default = "default_stream_type")]
    pub stream_type: String,
    /// Offset for artifact modification times, e.g. `+00:00` or `+02:00`
    #[serde(default = "default_utc_offset")]
    pub partition_utc_offset: String,
}

/// `[syslog]`
#[derive(Debug, Clone, Deserialize)]
pub struct SyslogSettings {
    /// Forward artifact lines to syslog
    #[serde(default)]
    pub syslog_output: bool,
    /// Collector host
    #[serde(default = "default_syslog_server")]
    pub syslog_server: String,
    /// Collector UDP port
    #[serde(default = "default_syslog_port")]
    pub syslog_port: u16,
}

impl Default for SyslogSettings {
    fn default() -> Self {
        Self {
            syslog_output: false,
            syslog_server: default_syslog_server(),
            syslog_port: DEFAULT_SYSLOG_PORT,
        }
    }
}

/// `[pump]`
#[derive(Debug, Clone, Deserialize)]
pub struct PumpSettings {
    /// Pause after a "no more logs" response
    #[serde(default = "default_idle_backoff_secs")]
    pub idle_backoff_secs: u64,
    /// Restart discovery + loop after the loop stops
    #[serde(default = "default_true")]
    pub restart_on_stop: bool,
    /// Pause before such a restart
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    /// Overall HTTP request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PumpSettings {
    fn default() -> Self {
        Self {
            idle_backoff_secs: default_idle_backoff_secs(),
            restart_on_stop: true,
            restart_delay_secs: default_restart_delay_secs(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn default_discovery_url() -> String {
    DEFAULT_DISCOVERY_URL.to_string()
}

fn default_stream_type() -> String {
    DEFAULT_STREAM_TYPE.to_string()
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_syslog_server() -> String {
    "localhost".to_string()
}

fn default_syslog_port() -> u16 {
    DEFAULT_SYSLOG_PORT
}

fn default_idle_backoff_secs() -> u64 {
    IDLE_BACKOFF.as_secs()
}

fn default_restart_delay_secs() -> u64 {
    RESTART_DELAY.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Read, parse and validate a settings file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ReadFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let settings = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject empty or malformed values
    pub fn validate(&self) -> Result<(), SettingsError> {
        let auth = &self.authentication;
        for (name, value) in [
            ("authentication.email_address", &auth.email_address),
            ("authentication.access_key", &auth.access_key),
            ("authentication.secret_key", &auth.secret_key),
            ("authentication.app_id", &auth.app_id),
            ("authentication.app_key", &auth.app_key),
            ("authentication.discovery_url", &auth.discovery_url),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::Invalid(format!("{name} cannot be empty")));
            }
        }

        if self.logging.log_file_path.as_os_str().is_empty() {
            return Err(SettingsError::Invalid(
                "logging.log_file_path cannot be empty".to_string(),
            ));
        }
        if self.logging.checkpoint_dir.as_os_str().is_empty() {
            return Err(SettingsError::Invalid(
                "logging.checkpoint_dir cannot be empty".to_string(),
            ));
        }

        let stream = &self.logging.stream_type;
        if stream.is_empty()
            || !stream
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SettingsError::Invalid(format!(
                "logging.stream_type {stream:?} must be non-empty and alphanumeric"
            )));
        }

        self.utc_offset()?;

        if self.syslog.syslog_output && self.syslog.syslog_server.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "syslog.syslog_server cannot be empty when syslog_output is enabled".to_string(),
            ));
        }

        if self.pump.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "pump.request_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed `logging.partition_utc_offset`
    pub fn utc_offset(&self) -> Result<FixedOffset, SettingsError> {
        parse_utc_offset(&self.logging.partition_utc_offset)
    }

    /// API credentials
    pub fn credentials(&self) -> Credentials {
        let auth = &self.authentication;
        Credentials {
            access_key: auth.access_key.clone(),
            secret_key: auth.secret_key.clone(),
            app_id: auth.app_id.clone(),
            app_key: auth.app_key.clone(),
        }
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.pump.request_timeout_secs)
    }

    /// Immutable stream context for the pump
    pub fn stream_context(&self) -> Result<StreamContext, SettingsError> {
        Ok(StreamContext::new(
            self.authentication.email_address.clone(),
            self.logging.checkpoint_dir.clone(),
            self.logging.log_file_path.clone(),
        )
        .with_stream_type(self.logging.stream_type.clone())
        .with_compression(self.logging.use_compression_where_possible)
        .with_syslog(self.syslog.syslog_output)
        .with_utc_offset(self.utc_offset()?)
        .with_idle_backoff(Duration::from_secs(self.pump.idle_backoff_secs))
        .with_restart(
            self.pump.restart_on_stop,
            Duration::from_secs(self.pump.restart_delay_secs),
        ))
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC`
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, SettingsError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0)
            .ok_or_else(|| SettingsError::Invalid("zero offset".to_string()));
    }
    value.parse::<FixedOffset>().map_err(|e| {
        SettingsError::Invalid(format!(
            "logging.partition_utc_offset {value:?} is not an offset like +02:00: {e}"
        ))
    })
}
