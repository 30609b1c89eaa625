//! Integration tests for merge checking.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zipmerge::{check_mergeable, EntrySource, MergeError};

/// Helper to create a ZIP archive; names ending in `/` become directories.
fn create_zip_archive(archive_path: &Path, entries: &[(&str, &[u8])]) -> std::io::Result<()> {
    use zip::write::SimpleFileOptions;

    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options)?;
        } else {
            zip.start_file(*name, options)?;
            zip.write_all(content)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// A.zip holds x.txt (10 bytes) and y.txt (20 bytes),
/// B.zip holds y.txt (99 bytes) and z.txt (5 bytes).
fn create_overlapping_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let a = dir.join("A.zip");
    let b = dir.join("B.zip");
    create_zip_archive(&a, &[("x.txt", &[b'x'; 10]), ("y.txt", &[b'y'; 20])]).unwrap();
    create_zip_archive(&b, &[("y.txt", &[b'Y'; 99]), ("z.txt", &[b'z'; 5])]).unwrap();
    (a, b)
}

#[test]
fn test_overlapping_entry_reports_both_sources_and_sizes() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = create_overlapping_pair(temp_dir.path());

    let result = check_mergeable(&[a.clone(), b.clone()], None);

    let conflicts = match result {
        Err(MergeError::EntryConflicts(conflicts)) => conflicts,
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    };

    assert_eq!(conflicts.len(), 1);
    let record = conflicts.get("y.txt").expect("y.txt should conflict");
    assert_eq!(record.sources.len(), 2);

    assert_eq!(record.sources[0].source, EntrySource::Archive(a));
    assert_eq!(record.sources[0].entry.size, 20);
    assert_eq!(record.sources[1].source, EntrySource::Archive(b));
    assert_eq!(record.sources[1].entry.size, 99);
}

#[test]
fn test_conflict_message_lists_sizes() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = create_overlapping_pair(temp_dir.path());

    let err = check_mergeable(&[a, b], None).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("1 conflict(s)"));
    assert!(message.contains("File: \"y.txt\""));
    assert!(message.contains("(20 bytes)"));
    assert!(message.contains("(99 bytes)"));
}

#[test]
fn test_repeated_path_fails_regardless_of_contents() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("A.zip");
    create_zip_archive(&a, &[("x.txt", b"only")]).unwrap();

    let result = check_mergeable(&[a.clone(), a.clone()], None);
    match result {
        Err(MergeError::RepeatedArchives(paths)) => assert_eq!(paths, vec![a]),
        other => panic!("Expected RepeatedArchives error, got: {:?}", other),
    }
}

#[test]
fn test_repeated_paths_never_open_archives() {
    // None of these files exist; opening any of them would surface as Io
    let paths = ["one.zip", "two.zip", "one.zip", "three.zip", "two.zip"];

    let result = check_mergeable(&paths, None);
    match result {
        Err(MergeError::RepeatedArchives(repeated)) => {
            assert_eq!(
                repeated,
                vec![PathBuf::from("one.zip"), PathBuf::from("two.zip")]
            );
        }
        other => panic!("Expected RepeatedArchives error, got: {:?}", other),
    }
}

#[test]
fn test_repeated_path_checked_before_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = create_overlapping_pair(temp_dir.path());

    let result = check_mergeable(&[a.clone(), b, a], None);
    assert!(matches!(result, Err(MergeError::RepeatedArchives(_))));
}

#[test]
fn test_unique_entries_are_mergeable() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.zip");
    let b = temp_dir.path().join("b.zip");
    let output_dir = temp_dir.path().join("out");
    fs::create_dir_all(output_dir.join("unrelated")).unwrap();
    fs::write(output_dir.join("unrelated/keep.txt"), b"keep").unwrap();

    create_zip_archive(&a, &[("a/", b""), ("a/one.txt", b"1")]).unwrap();
    create_zip_archive(&b, &[("b/", b""), ("b/two.txt", b"2")]).unwrap();

    assert!(check_mergeable(&[a.clone(), b.clone()], None).is_ok());
    assert!(check_mergeable(&[a, b], Some(output_dir.as_path())).is_ok());
}

#[test]
fn test_existing_destination_file_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.zip");
    let output_dir = temp_dir.path().join("out");

    create_zip_archive(&a, &[("docs/", b""), ("docs/readme.md", &[b'r'; 120])]).unwrap();
    fs::create_dir_all(output_dir.join("docs")).unwrap();
    fs::write(output_dir.join("docs/readme.md"), vec![b'o'; 340]).unwrap();

    // Without a destination nothing conflicts
    assert!(check_mergeable(&[a.clone()], None).is_ok());

    let result = check_mergeable(&[a.clone()], Some(output_dir.as_path()));
    let conflicts = match result {
        Err(MergeError::EntryConflicts(conflicts)) => conflicts,
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    };

    // Existing directories in the destination are not sources
    assert_eq!(conflicts.names().collect::<Vec<_>>(), vec!["docs/readme.md"]);

    let record = conflicts.get("docs/readme.md").unwrap();
    assert_eq!(
        record.sources[0].source,
        EntrySource::Destination(output_dir.clone())
    );
    assert_eq!(record.sources[0].entry.size, 340);
    assert_eq!(record.sources[1].source, EntrySource::Archive(a));
    assert_eq!(record.sources[1].entry.size, 120);
}

#[test]
fn test_missing_destination_counts_as_empty() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.zip");
    create_zip_archive(&a, &[("x.txt", b"x")]).unwrap();

    let output_dir = temp_dir.path().join("not-yet-created");
    assert!(check_mergeable(&[a], Some(output_dir.as_path())).is_ok());
    assert!(!output_dir.exists());
}

#[test]
fn test_shared_directory_entries_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.zip");
    let b = temp_dir.path().join("b.zip");
    create_zip_archive(&a, &[("shared/", b""), ("shared/a.txt", b"a")]).unwrap();
    create_zip_archive(&b, &[("shared/", b""), ("shared/b.txt", b"b")]).unwrap();

    let result = check_mergeable(&[a, b], None);
    match result {
        Err(MergeError::EntryConflicts(conflicts)) => {
            assert_eq!(conflicts.names().collect::<Vec<_>>(), vec!["shared/"]);
        }
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    }
}

#[test]
fn test_dot_prefixed_entry_conflicts_with_destination_file() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.zip");
    let output_dir = temp_dir.path().join("out");

    create_zip_archive(&a, &[("./keep.txt", b"from archive")]).unwrap();
    fs::create_dir_all(&output_dir).unwrap();
    fs::write(output_dir.join("keep.txt"), b"precious").unwrap();

    let result = check_mergeable(&[a.clone()], Some(output_dir.as_path()));
    let conflicts = match result {
        Err(MergeError::EntryConflicts(conflicts)) => conflicts,
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    };

    assert_eq!(conflicts.names().collect::<Vec<_>>(), vec!["keep.txt"]);
    let record = conflicts.get("keep.txt").unwrap();
    assert_eq!(record.sources[0].source, EntrySource::Destination(output_dir.clone()));
    assert_eq!(record.sources[1].source, EntrySource::Archive(a));
    assert_eq!(record.sources[1].entry.name, "./keep.txt");
}

#[test]
fn test_equivalent_entry_names_across_archives_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.zip");
    let b = temp_dir.path().join("b.zip");

    create_zip_archive(&a, &[("./x.txt", b"a"), ("dir//y.txt", b"a")]).unwrap();
    create_zip_archive(&b, &[("x.txt", b"b"), ("dir/./y.txt", b"b")]).unwrap();

    let result = check_mergeable(&[a, b], None);
    match result {
        Err(MergeError::EntryConflicts(conflicts)) => {
            assert_eq!(
                conflicts.names().collect::<Vec<_>>(),
                vec!["dir/y.txt", "x.txt"]
            );
        }
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    }
}

#[test]
fn test_detection_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = create_overlapping_pair(temp_dir.path());
    let paths = vec![a, b];

    let first = match check_mergeable(paths.as_slice(), None) {
        Err(MergeError::EntryConflicts(conflicts)) => conflicts,
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    };
    let second = match check_mergeable(paths.as_slice(), None) {
        Err(MergeError::EntryConflicts(conflicts)) => conflicts,
        other => panic!("Expected EntryConflicts error, got: {:?}", other),
    };
    assert_eq!(first, second);

    let unique = temp_dir.path().join("unique.zip");
    create_zip_archive(&unique, &[("u.txt", b"u")]).unwrap();
    assert!(check_mergeable(&[unique.clone()], None).is_ok());
    assert!(check_mergeable(&[unique], None).is_ok());
}

#[test]
fn test_corrupted_archive_aborts_check() {
    let temp_dir = TempDir::new().unwrap();
    let good = temp_dir.path().join("good.zip");
    let bad = temp_dir.path().join("bad.zip");
    create_zip_archive(&good, &[("x.txt", b"x")]).unwrap();
    fs::write(&bad, "definitely not a zip container ".repeat(10)).unwrap();

    let result = check_mergeable(&[good, bad.clone()], None);
    match result {
        Err(MergeError::NotAnArchive { path, .. }) => assert_eq!(path, bad),
        other => panic!("Expected NotAnArchive error, got: {:?}", other),
    }
}

#[test]
fn test_missing_archive_aborts_check() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.zip");

    let result = check_mergeable(&[missing.clone()], None);
    match result {
        Err(MergeError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected Io error, got: {:?}", other),
    }
}

#[test]
fn test_traversal_entry_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let evil = temp_dir.path().join("evil.zip");
    create_zip_archive(&evil, &[("../escaped.txt", b"gotcha")]).unwrap();

    let result = check_mergeable(&[evil], None);
    assert!(matches!(result, Err(MergeError::Security(_))));
}
