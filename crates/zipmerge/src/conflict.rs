//! Conflict detection across input archives and the destination directory.
//!
//! Two checks run in order. Repeated input paths are rejected before any
//! archive is opened; only then are entry names compared across every
//! archive and every file already present in the destination.

use crate::archive::{identical_groups, ArchiveHandle};
use crate::error::MergeError;
use crate::safety::normalized_entry_name;
use crate::types::{ConflictRecord, ConflictSet, EntryMetadata, EntrySource, SourcedEntry};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Check whether a set of archives can be merged into `destination`.
///
/// # Errors
///
/// Returns an error if:
/// - A path occurs more than once (`MergeError::RepeatedArchives`); no archive is opened
/// - An archive cannot be opened or parsed
/// - An entry name would escape the destination directory
/// - The destination cannot be walked
/// - An entry name appears in more than one source (`MergeError::EntryConflicts`)
pub fn check_mergeable<P: AsRef<Path>>(
    archive_paths: &[P],
    destination: Option<&Path>,
) -> Result<(), MergeError> {
    let repeated = find_repeated(archive_paths);
    if !repeated.is_empty() {
        return Err(MergeError::RepeatedArchives(repeated));
    }

    // Handles are released when this vector drops, on every return path
    let handles = archive_paths
        .iter()
        .map(|path| ArchiveHandle::open(path))
        .collect::<Result<Vec<_>, _>>()?;

    for group in identical_groups(&handles) {
        warn!("Byte-identical archives supplied under different paths: {:?}", group);
    }

    let mut sources = Vec::new();

    if let Some(dir) = destination {
        let existing = snapshot_destination(dir)?;
        debug!("Destination {} holds {} files", dir.display(), existing.len());

        sources.extend(existing.into_iter().map(|entry| SourcedEntry {
            source: EntrySource::Destination(dir.to_path_buf()),
            entry,
        }));
    }

    for handle in &handles {
        sources.extend(archive_entries(handle));
    }

    let conflicts = collect_conflicts(sources)?;
    if !conflicts.is_empty() {
        return Err(MergeError::EntryConflicts(conflicts));
    }

    debug!("{} archives are mergeable", handles.len());
    Ok(())
}

/// Paths that occur more than once, compared literally and reported once each.
pub fn find_repeated<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut counts: HashMap<&OsStr, usize> = HashMap::new();

    for path in paths {
        *counts.entry(path.as_ref().as_os_str()).or_insert(0) += 1;
    }

    let mut repeated: Vec<PathBuf> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(path, _)| PathBuf::from(path))
        .collect();

    repeated.sort();
    repeated
}

/// Every entry of an opened archive, tagged with the archive's path.
pub fn archive_entries(handle: &ArchiveHandle) -> impl Iterator<Item = SourcedEntry> + '_ {
    handle.entries().iter().map(move |entry| SourcedEntry {
        source: EntrySource::Archive(handle.path().to_path_buf()),
        entry: entry.clone(),
    })
}

/// Group entries by the name they extract to and keep the names reported by
/// more than one source.
///
/// Archive entry names are normalized first (`./a.txt` and `a.txt` are the
/// same name); the raw name stays in each source's [`EntryMetadata`].
/// Destination names are already in normalized form.
///
/// # Errors
///
/// Returns `MergeError::Security` if an archive entry name would escape the
/// destination directory.
pub fn collect_conflicts<I>(sources: I) -> Result<ConflictSet, MergeError>
where
    I: IntoIterator<Item = SourcedEntry>,
{
    let mut seen: HashMap<String, ConflictRecord> = HashMap::new();

    for sourced in sources {
        let key = match sourced.source {
            EntrySource::Archive(_) => {
                normalized_entry_name(&sourced.entry.name, sourced.entry.is_directory)?
            }
            EntrySource::Destination(_) => sourced.entry.name.clone(),
        };

        seen.entry(key)
            .or_insert_with_key(|name| ConflictRecord::new(name.clone()))
            .sources
            .push(sourced);
    }

    let mut conflicts = ConflictSet::new();
    for record in seen.into_values().filter(ConflictRecord::is_conflicting) {
        conflicts.insert(record);
    }
    Ok(conflicts)
}

/// List the files under `dir` as entries named relative to it with `/` separators.
///
/// Directories are not listed. A missing `dir` yields an empty list.
pub fn snapshot_destination(dir: &Path) -> Result<Vec<EntryMetadata>, MergeError> {
    match fs::symlink_metadata(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(MergeError::io(dir, e)),
        Ok(_) => {}
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;

        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let size = entry
            .metadata()
            .map_err(|e| walk_error(entry.path(), e))?
            .len();

        files.push(EntryMetadata {
            name,
            size,
            is_directory: false,
        });
    }

    Ok(files)
}

fn walk_error(fallback: &Path, e: walkdir::Error) -> MergeError {
    let path = e
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    MergeError::Io {
        path,
        source: e.into(),
    }
}
