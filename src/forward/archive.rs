//! ZIP extraction for compressed artifacts

use super::{ForwardError, ForwardResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Extract every entry of `archive` into `dest`
///
/// Returns the extracted regular files in archive order. Entries whose names
/// would escape `dest` are refused by the zip reader.
pub fn extract_all(archive: &Path, dest: &Path) -> ForwardResult<Vec<PathBuf>> {
    let file = File::open(archive)
        .map_err(|e| ForwardError::ArchiveError(format!("{}: {e}", archive.display())))?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| ForwardError::ArchiveError(format!("Failed to open ZIP {}: {e}", archive.display())))?;

    zip.extract(dest)
        .map_err(|e| ForwardError::ArchiveError(format!("Failed to extract {}: {e}", archive.display())))?;

    let mut files = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let entry = zip
            .by_index(index)
            .map_err(|e| ForwardError::ArchiveError(format!("Failed to read ZIP entry: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        match entry.enclosed_name() {
            Some(name) => files.push(dest.join(name)),
            None => warn!(entry = entry.name(), "Skipping ZIP entry with unsafe path"),
        }
    }

    debug!(archive = %archive.display(), entries = files.len(), "Extracted archive");
    Ok(files)
}
