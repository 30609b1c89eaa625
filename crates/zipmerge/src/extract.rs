//! Merge extraction: validate the whole batch, then unpack every archive.

use crate::archive::{ArchiveHandle, ExtractedEntry};
use crate::conflict::check_mergeable;
use crate::error::MergeError;
use crate::inputs::resolve_archive_paths;
use crate::types::{MergeOptions, MergeStats};
use crate::ProgressCallback;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Merge a set of archives into `options.output_dir`.
///
/// The archive list is `archive_paths` followed by the `.zip` files found in
/// `options.input_dir`. Conflict detection over the complete list finishes
/// before anything is written; if it fails, the destination is untouched.
///
/// Extraction itself is not transactional. When an entry fails to extract,
/// entries already written stay on disk and the error is returned.
///
/// # Arguments
///
/// * `archive_paths` - Archives named explicitly by the caller
/// * `options` - Input directory and destination
/// * `progress_cb` - Called after each file with the entry name, the running
///   byte total and the entry size
///
/// # Returns
///
/// Returns `MergeStats` with extraction statistics on success.
pub fn merge_extract(
    archive_paths: &[PathBuf],
    options: &MergeOptions,
    progress_cb: &ProgressCallback,
) -> Result<MergeStats, MergeError> {
    let start_time = Instant::now();
    let output_dir = options.output_dir.as_path();

    let paths = resolve_archive_paths(archive_paths, options.input_dir.as_deref())?;
    if paths.is_empty() {
        return Err(MergeError::NoInputs);
    }

    check_mergeable(paths.as_slice(), Some(output_dir))?;

    info!(
        "Merging {} archives into {}",
        paths.len(),
        output_dir.display()
    );

    fs::create_dir_all(output_dir).map_err(|e| MergeError::io(output_dir, e))?;

    let mut stats = MergeStats::default();

    for path in &paths {
        extract_one_archive(path, output_dir, &mut stats, progress_cb)?;
        stats.archives_merged += 1;
    }

    stats.duration = start_time.elapsed();
    info!(
        "Merged {} archives: {} files, {} directories, {} bytes",
        stats.archives_merged, stats.files_extracted, stats.directories_created, stats.bytes_written
    );
    Ok(stats)
}

fn extract_one_archive(
    path: &Path,
    output_dir: &Path,
    stats: &mut MergeStats,
    progress_cb: &ProgressCallback,
) -> Result<(), MergeError> {
    let mut handle = ArchiveHandle::open(path)?;

    let result = handle.extract_all(output_dir, |entry, outcome| match outcome {
        ExtractedEntry::Directory => stats.directories_created += 1,
        ExtractedEntry::File { bytes } => {
            stats.files_extracted += 1;
            stats.bytes_written += bytes;
            progress_cb(&entry.name, stats.bytes_written, Some(entry.size));
        }
    });

    handle.close();
    result
}
