//! Type definitions for merge checking and extraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Individual entry within an archive, or a file already in the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Logical path of the entry, used as the merge key
    pub name: String,

    /// Uncompressed size in bytes
    pub size: u64,

    /// Whether this entry is a directory
    pub is_directory: bool,
}

impl EntryMetadata {
    /// Zip writers sometimes emit nameless, empty records. They carry nothing
    /// to extract and are dropped from entry lists.
    pub fn is_padding(&self) -> bool {
        self.size == 0 && self.name.trim_matches('/').is_empty()
    }
}

/// Where an entry was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum EntrySource {
    /// An input archive, identified by the path the caller supplied
    Archive(PathBuf),

    /// A file already present in the destination directory
    Destination(PathBuf),
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySource::Archive(path) => write!(f, "archive \"{}\"", path.display()),
            EntrySource::Destination(path) => write!(f, "destination \"{}\"", path.display()),
        }
    }
}

/// An entry together with the source that reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedEntry {
    pub source: EntrySource,
    pub entry: EntryMetadata,
}

/// Every source that produced a given entry name, in recording order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub name: String,
    pub sources: Vec<SourcedEntry>,
}

impl ConflictRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    /// A name conflicts once a second source reports it.
    pub fn is_conflicting(&self) -> bool {
        self.sources.len() > 1
    }
}

/// Conflicting entry names, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictSet(BTreeMap<String, ConflictRecord>);

impl ConflictSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ConflictRecord) {
        self.0.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&ConflictRecord> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &ConflictRecord> {
        self.0.values()
    }
}

impl fmt::Display for ConflictSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self.records() {
            write!(f, "\n  File: \"{}\"", record.name)?;
            for sourced in &record.sources {
                write!(
                    f,
                    "\n    found in {} ({} bytes)",
                    sourced.source, sourced.entry.size
                )?;
            }
        }
        Ok(())
    }
}

/// Serializable view of an opened archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSummary {
    /// Path the archive was opened from
    pub path: PathBuf,

    /// Hex SHA-256 of the raw archive bytes
    pub checksum: String,

    /// Number of entries after padding is filtered
    pub entries: u64,

    /// Sum of uncompressed entry sizes
    pub uncompressed_bytes: u64,

    /// List of all entries in the archive
    pub entry_list: Vec<EntryMetadata>,
}

/// Options for merge extraction.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Directory scanned (non-recursively) for additional `.zip` inputs
    pub input_dir: Option<PathBuf>,

    /// Directory the archives are merged into
    pub output_dir: PathBuf,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Statistics about a completed merge extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeStats {
    /// Number of archives extracted
    pub archives_merged: u64,

    /// Number of files written
    pub files_extracted: u64,

    /// Number of directory entries created
    pub directories_created: u64,

    /// Total bytes written to disk
    pub bytes_written: u64,

    /// Duration of the merge (in seconds)
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl Default for MergeStats {
    fn default() -> Self {
        Self {
            archives_merged: 0,
            files_extracted: 0,
            directories_created: 0,
            bytes_written: 0,
            duration: Duration::from_secs(0),
        }
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
