//! Archive reading: entry listing, identity checksum and entry extraction.

use crate::error::MergeError;
use crate::safety::validate_entry_path;
use crate::types::{ArchiveSummary, EntryMetadata};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

type ZipReader = ZipArchive<BufReader<File>>;

/// What writing a single entry produced on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractedEntry {
    /// A directory (and its parents) was created
    Directory,
    /// A file was written with this many bytes
    File { bytes: u64 },
}

/// One opened zip archive.
///
/// The underlying file stays open until [`ArchiveHandle::close`] is called or
/// the handle is dropped, whichever comes first.
pub struct ArchiveHandle {
    path: PathBuf,
    checksum: String,
    entries: Vec<EntryMetadata>,
    // central directory index of each kept entry, parallel to `entries`
    indices: Vec<usize>,
    reader: Option<ZipReader>,
}

impl ArchiveHandle {
    /// Open an archive, hash its raw bytes and read its entry table.
    ///
    /// Padding entries (empty name, zero size) are left out of
    /// [`ArchiveHandle::entries`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or read (`MergeError::Io`)
    /// - The file is not a valid zip container (`MergeError::NotAnArchive`)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MergeError> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| MergeError::io(path, e))?;

        // Identity is computed over the container bytes, not the entry contents
        let checksum = checksum_reader(&mut file).map_err(|e| MergeError::io(path, e))?;
        file.rewind().map_err(|e| MergeError::io(path, e))?;

        let mut reader =
            ZipArchive::new(BufReader::new(file)).map_err(|e| map_zip_error(path, e))?;

        let mut entries = Vec::with_capacity(reader.len());
        let mut indices = Vec::with_capacity(reader.len());

        for index in 0..reader.len() {
            let zip_file = reader
                .by_index_raw(index)
                .map_err(|e| map_zip_error(path, e))?;

            let entry = EntryMetadata {
                name: zip_file.name().to_string(),
                size: zip_file.size(),
                is_directory: zip_file.is_dir(),
            };

            if entry.is_padding() {
                continue;
            }

            entries.push(entry);
            indices.push(index);
        }

        debug!(
            "Opened archive {} ({} entries, sha256 {})",
            path.display(),
            entries.len(),
            checksum
        );

        Ok(Self {
            path: path.to_path_buf(),
            checksum,
            entries,
            indices,
            reader: Some(reader),
        })
    }

    /// Path the archive was opened from, exactly as supplied.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase hex SHA-256 of the raw archive bytes.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn entries(&self) -> &[EntryMetadata] {
        &self.entries
    }

    /// Whether both handles were opened from byte-identical files.
    pub fn is_same_archive(&self, other: &ArchiveHandle) -> bool {
        self.checksum == other.checksum
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Release the underlying file. Closing an already closed handle does nothing.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed archive {}", self.path.display());
        }
    }

    pub fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            path: self.path.clone(),
            checksum: self.checksum.clone(),
            entries: self.entries.len() as u64,
            uncompressed_bytes: self.entries.iter().map(|e| e.size).sum(),
            entry_list: self.entries.clone(),
        }
    }

    /// Write every entry into `dest`, in archive order.
    ///
    /// `on_entry` is called after each entry lands on disk. Extraction stops at
    /// the first failing entry; entries written before it stay in place.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The handle was already closed
    /// - An entry name would escape `dest`
    /// - An entry cannot be decompressed or written
    pub fn extract_all<F>(&mut self, dest: &Path, mut on_entry: F) -> Result<(), MergeError>
    where
        F: FnMut(&EntryMetadata, ExtractedEntry),
    {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| MergeError::ArchiveClosed(self.path.clone()))?;

        for (entry, &index) in self.entries.iter().zip(&self.indices) {
            let outcome = extract_entry(reader, index, entry, dest, &self.path)?;
            on_entry(entry, outcome);
        }

        Ok(())
    }
}

/// Group the paths of distinct handles whose archives are byte-identical.
///
/// Only groups with at least two members are returned.
pub fn identical_groups(handles: &[ArchiveHandle]) -> Vec<Vec<PathBuf>> {
    let mut by_checksum: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();

    for handle in handles {
        by_checksum
            .entry(handle.checksum())
            .or_default()
            .push(handle.path.clone());
    }

    by_checksum
        .into_values()
        .filter(|paths| paths.len() > 1)
        .collect()
}

/// Stream a reader through SHA-256 and return the hex digest.
pub fn checksum_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hex SHA-256 of a file's raw bytes.
pub fn checksum_file(path: &Path) -> Result<String, MergeError> {
    let mut file = File::open(path).map_err(|e| MergeError::io(path, e))?;
    checksum_reader(&mut file).map_err(|e| MergeError::io(path, e))
}

fn extract_entry(
    reader: &mut ZipReader,
    index: usize,
    entry: &EntryMetadata,
    dest: &Path,
    archive_path: &Path,
) -> Result<ExtractedEntry, MergeError> {
    let relative = validate_entry_path(&entry.name)?;
    let target = dest.join(relative);

    if entry.is_directory {
        fs::create_dir_all(&target).map_err(|e| MergeError::io(&target, e))?;
        debug!("Created directory {}", target.display());
        return Ok(ExtractedEntry::Directory);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
    }

    let mut zip_file = reader
        .by_index(index)
        .map_err(|e| map_zip_error(archive_path, e))?;

    // Truncates anything already at the target
    let mut out = File::create(&target).map_err(|e| MergeError::io(&target, e))?;
    let bytes = io::copy(&mut zip_file, &mut out).map_err(|e| MergeError::io(&target, e))?;

    #[cfg(unix)]
    if let Some(mode) = zip_file.unix_mode() {
        use std::os::unix::fs::PermissionsExt;

        if mode & 0o777 != 0 {
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))
                .map_err(|e| MergeError::io(&target, e))?;
        }
    }

    debug!("Extracted {} ({} bytes)", target.display(), bytes);
    Ok(ExtractedEntry::File { bytes })
}

/// Map zip reader errors, keeping genuine I/O failures apart from malformed input.
fn map_zip_error(path: &Path, e: ZipError) -> MergeError {
    match e {
        ZipError::Io(source)
            if !matches!(
                source.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData
            ) =>
        {
            MergeError::io(path, source)
        }
        other => MergeError::NotAnArchive {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
