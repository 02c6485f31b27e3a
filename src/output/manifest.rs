//! `manifest.csv`: one row per processed entry, in processing order.

use std::path::Path;

use serde::Serialize;

use super::OutputError;

/// File name of the manifest at the output tree root.
pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

/// Header row, always written even when there are no records.
pub const MANIFEST_HEADER: [&str; 4] = ["kitchen_name", "url", "description_chars", "images_saved"];

/// Summary of one processed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    /// Output directory name of the entry.
    pub kitchen_name: String,
    /// Detail page URL.
    pub url: String,
    /// Description length in characters (not bytes).
    pub description_chars: usize,
    /// Images written successfully.
    pub images_saved: usize,
}

/// Writes the header and `records` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`OutputError::Csv`] when the file cannot be created or written.
pub fn write_manifest(path: &Path, records: &[ManifestRecord]) -> Result<(), OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(MANIFEST_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| OutputError::io(path, e))?;
    Ok(())
}
