//! Run artifacts: output tree, manifest and archive.

mod archive;
mod manifest;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use archive::write_archive;
pub use manifest::{MANIFEST_FILE_NAME, MANIFEST_HEADER, ManifestRecord, write_manifest};

/// Name of the per-entry description file.
pub const DESCRIPTION_FILE_NAME: &str = "descrizione.txt";

/// Errors writing run artifacts to the local filesystem.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A file or directory operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be written.
    #[error("manifest error: {0}")]
    Csv(#[from] csv::Error),

    /// The archive could not be written.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Removes `dir` (if present) and recreates it empty.
///
/// # Errors
///
/// Returns [`OutputError::Io`] when the directory cannot be removed or created.
pub fn reset_dir(dir: &Path) -> Result<(), OutputError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(OutputError::io(dir, e)),
    }
    std::fs::create_dir_all(dir).map_err(|e| OutputError::io(dir, e))
}

/// Removes a file, treating a missing file as success.
///
/// # Errors
///
/// Returns [`OutputError::Io`] for any other removal failure.
pub fn remove_file_if_exists(path: &Path) -> Result<(), OutputError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OutputError::io(path, e)),
    }
}

/// Creates `entry_dir` and writes its description file.
///
/// # Errors
///
/// Returns [`OutputError::Io`] when the directory or file cannot be written.
pub fn write_description(entry_dir: &Path, description: &str) -> Result<PathBuf, OutputError> {
    std::fs::create_dir_all(entry_dir).map_err(|e| OutputError::io(entry_dir, e))?;
    let path = entry_dir.join(DESCRIPTION_FILE_NAME);
    std::fs::write(&path, description).map_err(|e| OutputError::io(&path, e))?;
    Ok(path)
}
