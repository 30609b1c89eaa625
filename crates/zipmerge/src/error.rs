//! Error types for merge checking and merge extraction.

use crate::types::ConflictSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for merge operations.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The same archive path was supplied more than once.
    #[error("Repeated archive inputs: {}", join_paths(.0))]
    RepeatedArchives(Vec<PathBuf>),

    /// One or more entry names appear in more than one source.
    #[error("Conflicting entries found: {} conflict(s){}", .0.len(), .0)]
    EntryConflicts(ConflictSet),

    /// The file could not be parsed as a zip container.
    #[error("Not a zip archive: {}: {reason}", .path.display())]
    NotAnArchive {
        /// Path of the offending file
        path: PathBuf,
        /// Reason reported by the zip reader
        reason: String,
    },

    /// An I/O error occurred while reading, walking or writing.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path the failing operation was working on
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry name would escape the destination directory.
    #[error("Security violation: {0}")]
    Security(#[from] SecurityError),

    /// The archive handle was already closed.
    #[error("Archive already closed: {}", .0.display())]
    ArchiveClosed(PathBuf),

    /// Neither explicit archives nor an input directory yielded anything to merge.
    #[error("No input archives provided")]
    NoInputs,
}

impl MergeError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        MergeError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Security-related errors for archive entry names.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Path traversal attempt detected (e.g., "../../../etc/passwd").
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    /// Absolute path not allowed in archive entries.
    #[error("Absolute path not allowed: {0}")]
    AbsolutePath(String),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
