//! Entry name validation.
//!
//! Entry names are joined onto the destination directory during extraction,
//! so a name must never resolve outside of it (zip-slip).

use crate::error::SecurityError;
use std::path::{Component, Path, PathBuf};

/// Validates and normalizes an archive entry name.
///
/// This function performs the following checks:
/// - Rejects absolute paths and Windows drive prefixes
/// - Rejects names containing ".." components (path traversal)
/// - Drops "." components and redundant separators
///
/// A trailing `/` (directory entry) is accepted.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use zipmerge::safety::validate_entry_path;
///
/// let safe_path = validate_entry_path("dir/file.txt").unwrap();
/// assert_eq!(safe_path, Path::new("dir/file.txt"));
///
/// assert!(validate_entry_path("../../etc/passwd").is_err());
/// assert!(validate_entry_path("/etc/passwd").is_err());
/// ```
pub fn validate_entry_path(name: &str) -> Result<PathBuf, SecurityError> {
    let path = Path::new(name);

    if path.is_absolute() || name.starts_with('/') || name.starts_with('\\') {
        return Err(SecurityError::AbsolutePath(name.to_string()));
    }

    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => {
                // Backslash-separated names are not split by `components` on unix
                if part
                    .to_str()
                    .is_some_and(|s| s.split('\\').any(|segment| segment == ".."))
                {
                    return Err(SecurityError::PathTraversal(format!(
                        "Path contains '..' component: {}",
                        name
                    )));
                }
                normalized.push(part);
            }
            Component::CurDir => continue,
            Component::ParentDir => {
                return Err(SecurityError::PathTraversal(format!(
                    "Path contains '..' component: {}",
                    name
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SecurityError::AbsolutePath(name.to_string()));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(SecurityError::PathTraversal(format!(
            "Path normalizes to empty: {:?}",
            name
        )));
    }

    Ok(normalized)
}

/// The `/`-joined form of an entry name, matching where extraction writes it.
///
/// Directory entries keep a trailing `/`, so `dir/` and a file `dir` stay
/// distinct names.
pub fn normalized_entry_name(name: &str, is_directory: bool) -> Result<String, SecurityError> {
    let path = validate_entry_path(name)?;

    let mut normalized = path
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    if is_directory {
        normalized.push('/');
    }
    Ok(normalized)
}
