//! Gathering the archive list from explicit paths and an input directory.

use crate::error::MergeError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the `.zip` files directly inside `dir`.
///
/// The extension match ignores ASCII case. Subdirectories are not descended
/// into. Results are joined onto `dir` and sorted by file name.
pub fn scan_input_dir(dir: &Path) -> Result<Vec<PathBuf>, MergeError> {
    let read_dir = fs::read_dir(dir).map_err(|e| MergeError::io(dir, e))?;
    let mut archives = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(|e| MergeError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| MergeError::io(entry.path(), e))?;

        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if has_zip_extension(&path) {
            archives.push(path);
        }
    }

    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} archives in {}", archives.len(), dir.display());
    Ok(archives)
}

/// Explicit paths first, then whatever `input_dir` contributes.
pub fn resolve_archive_paths(
    explicit: &[PathBuf],
    input_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, MergeError> {
    let mut paths = explicit.to_vec();

    if let Some(dir) = input_dir {
        paths.extend(scan_input_dir(dir)?);
    }

    Ok(paths)
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}
