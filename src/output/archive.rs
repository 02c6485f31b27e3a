//! Zip packaging of the output tree under a fixed root folder.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::OutputError;

/// Packages every file below `tree_root` into `archive_path`.
///
/// Member names are `<root_name>/<relative path>` with `/` separators,
/// mirroring the tree layout. Files are added in sorted path order. Returns
/// the number of files written.
///
/// # Errors
///
/// Returns [`OutputError`] when the tree cannot be walked or the archive
/// cannot be written.
pub fn write_archive(
    tree_root: &Path,
    archive_path: &Path,
    root_name: &str,
) -> Result<usize, OutputError> {
    let files = collect_files(tree_root)?;

    let file = File::create(archive_path).map_err(|e| OutputError::io(archive_path, e))?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in &files {
        let name = member_name(root_name, tree_root, path);
        zip.start_file(name, options)?;
        let mut reader = BufReader::new(File::open(path).map_err(|e| OutputError::io(path, e))?);
        std::io::copy(&mut reader, &mut zip).map_err(|e| OutputError::io(path, e))?;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| OutputError::io(archive_path, e))?;
    debug!(archive = %archive_path.display(), files = files.len(), "archive written");
    Ok(files.len())
}

fn member_name(root_name: &str, tree_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(tree_root).unwrap_or(path);
    let mut name = root_name.trim_end_matches('/').to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

/// Regular files below `dir`, depth first, sorted by path.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| OutputError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| OutputError::io(&current, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| OutputError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
