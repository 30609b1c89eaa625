//! # Zipmerge
//!
//! Merge several zip archives into one directory, refusing to do so when any
//! two inputs would write the same path.
//!
//! Before anything is written, the whole batch is checked:
//!
//! 1. The same archive path must not be supplied twice.
//! 2. No entry name may appear in more than one archive, or match a file
//!    already present in the destination directory.
//!
//! Only when both checks pass are the archives extracted, in order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zipmerge::{check_mergeable, merge_extract, MergeOptions};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archives = vec![PathBuf::from("part-a.zip"), PathBuf::from("part-b.zip")];
//!
//! // Check only
//! check_mergeable(archives.as_slice(), None)?;
//!
//! // Check against the destination, then extract
//! let options = MergeOptions {
//!     input_dir: None,
//!     output_dir: PathBuf::from("merged"),
//! };
//! let progress_cb = |entry: &str, bytes: u64, _size: Option<u64>| {
//!     println!("Extracted: {} ({} bytes so far)", entry, bytes);
//! };
//!
//! let stats = merge_extract(&archives, &options, &progress_cb)?;
//! println!("Extracted {} files ({} bytes)", stats.files_extracted, stats.bytes_written);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod conflict;
pub mod error;
pub mod extract;
pub mod inputs;
pub mod safety;
pub mod types;

// Re-export main types
pub use archive::{ArchiveHandle, ExtractedEntry};
pub use error::{MergeError, SecurityError};
pub use types::{
    ArchiveSummary, ConflictRecord, ConflictSet, EntryMetadata, EntrySource, MergeOptions,
    MergeStats, SourcedEntry,
};

use std::path::{Path, PathBuf};

/// Type alias for progress callback functions.
///
/// The callback receives:
/// - `entry`: Name of the entry just extracted
/// - `bytes_written`: Number of bytes written so far across the merge
/// - `entry_size`: Uncompressed size of that entry, when known
pub type ProgressCallback = dyn Fn(&str, u64, Option<u64>) + Send + Sync;

/// Open an archive for inspection.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a zip archive.
pub fn open(path: &Path) -> Result<ArchiveHandle, MergeError> {
    ArchiveHandle::open(path)
}

/// Check whether archives can be merged without entry name collisions.
///
/// # Arguments
///
/// * `archive_paths` - Archives to check; each path must appear only once
/// * `destination` - Directory whose existing files also count as sources
///
/// # Errors
///
/// Returns an error if:
/// - A path is repeated (`MergeError::RepeatedArchives`)
/// - An entry name has more than one source (`MergeError::EntryConflicts`)
/// - An archive is unreadable or corrupt
pub fn check_mergeable<P: AsRef<Path>>(
    archive_paths: &[P],
    destination: Option<&Path>,
) -> Result<(), MergeError> {
    conflict::check_mergeable(archive_paths, destination)
}

/// Check a batch of archives, then extract all of them into one directory.
///
/// # Arguments
///
/// * `archive_paths` - Archives named explicitly
/// * `options` - Optional input directory to scan and the output directory
/// * `progress_cb` - Callback invoked after each extracted file
///
/// # Returns
///
/// Returns `MergeStats` with extraction statistics on success.
///
/// # Errors
///
/// Returns an error if:
/// - No archives were given or found (`MergeError::NoInputs`)
/// - The batch is not mergeable; nothing is written in that case
/// - An entry fails to extract; earlier entries are left in place
pub fn merge_extract(
    archive_paths: &[PathBuf],
    options: &MergeOptions,
    progress_cb: &ProgressCallback,
) -> Result<MergeStats, MergeError> {
    extract::merge_extract(archive_paths, options, progress_cb)
}
