//! Artifact naming and date-partitioned layout
//!
//! Downloaded log files carry their date in the filename: the first eight
//! characters after the final `_`, up to the first `.`. Artifacts are stored as
//! `<root>/<YYYYMMDD>/<filename>` and their modification time is pinned to
//! midnight of that date. Retention tooling relies on both.
//!
//! ```rust
//! use siem_log_pump::output::ArtifactName;
//! use std::path::Path;
//!
//! let name = ArtifactName::from_content_disposition(
//!     r#"attachment; filename="MTA_receipt_20240115.log.gz""#,
//! )
//! .unwrap();
//!
//! assert_eq!(name.partition(), "20240115");
//! assert_eq!(
//!     name.path_in(Path::new("/var/log/siem")),
//!     Path::new("/var/log/siem/20240115/MTA_receipt_20240115.log.gz")
//! );
//! ```

use super::{OutputError, OutputResult};
use chrono::{FixedOffset, NaiveDate, TimeZone};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Length of the `YYYYMMDD` date token
pub const DATE_TOKEN_LEN: usize = 8;

/// A validated artifact filename together with its date partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    file_name: String,
    partition: String,
    date: NaiveDate,
}

impl ArtifactName {
    /// Parse the filename out of a `Content-Disposition` header value
    ///
    /// The filename is the text between `="` and the closing `"`.
    pub fn from_content_disposition(header: &str) -> OutputResult<Self> {
        let (_, quoted) = header.split_once("=\"").ok_or_else(|| {
            OutputError::InvalidFileName(format!("no quoted filename in {header:?}"))
        })?;
        let file_name = quoted.strip_suffix('"').ok_or_else(|| {
            OutputError::InvalidFileName(format!("unterminated filename in {header:?}"))
        })?;

        Self::from_file_name(file_name)
    }

    /// Validate a bare filename and derive its partition
    ///
    /// # Security
    ///
    /// Names containing path separators or `..` are rejected so a response can
    /// never place a file outside its partition directory.
    pub fn from_file_name(file_name: &str) -> OutputResult<Self> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(OutputError::InvalidFileName(file_name.to_string()));
        }

        let partition = date_token(file_name)?;
        let date = NaiveDate::parse_from_str(&partition, "%Y%m%d").map_err(|e| {
            OutputError::InvalidDate {
                file_name: file_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            file_name: file_name.to_string(),
            partition,
            date,
        })
    }

    /// Original filename as sent by the API
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Partition directory name (`YYYYMMDD`)
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Date encoded in the filename
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Partition directory under `root`
    pub fn partition_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.partition)
    }

    /// Full artifact path under `root`
    pub fn path_in(&self, root: &Path) -> PathBuf {
        self.partition_dir(root).join(&self.file_name)
    }

    /// Modification time for the artifact: midnight of its date at `offset`
    pub fn modified_time(&self, offset: FixedOffset) -> OutputResult<SystemTime> {
        let midnight = self.date.and_hms_opt(0, 0, 0).ok_or_else(|| OutputError::InvalidDate {
            file_name: self.file_name.clone(),
            reason: "no midnight for date".to_string(),
        })?;
        let stamped = offset
            .from_local_datetime(&midnight)
            .single()
            .ok_or_else(|| OutputError::InvalidDate {
                file_name: self.file_name.clone(),
                reason: format!("ambiguous local time at offset {offset}"),
            })?;

        let secs = stamped.timestamp();
        if secs >= 0 {
            Ok(UNIX_EPOCH + Duration::from_secs(secs.unsigned_abs()))
        } else {
            Ok(UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()))
        }
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// First eight characters after the final `_`, cut at the first `.`
fn date_token(file_name: &str) -> OutputResult<String> {
    let tail = file_name.rsplit('_').next().unwrap_or(file_name);
    let stem = tail.split('.').next().unwrap_or(tail);
    let token: String = stem.chars().take(DATE_TOKEN_LEN).collect();

    if token.len() != DATE_TOKEN_LEN || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(OutputError::InvalidDate {
            file_name: file_name.to_string(),
            reason: format!("expected {DATE_TOKEN_LEN} digits, found {token:?}"),
        });
    }

    Ok(token)
}
