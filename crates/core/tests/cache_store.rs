//! Tests for the durable cache store

use lintwatch_core::cache::{CacheStore, temp_path};
use lintwatch_core::model::FileRecord;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_cache_persistence() {
    let temp = TempDir::new().unwrap();
    let location = temp.path().join("nested/dir/lint.json");

    let mut store = CacheStore::new();
    store.put(FileRecord::new(PathBuf::from("/src/a.js"), 100, true));
    store.put(FileRecord::new(PathBuf::from("/src/b.js"), 200, false));
    store.persist(&location).unwrap();

    assert!(!temp_path(&location).exists());

    let loaded = CacheStore::load(&location);
    assert_eq!(loaded, store);
}

#[test]
fn test_corrupt_cache_loads_empty() {
    let temp = TempDir::new().unwrap();
    let location = temp.path().join("lint.json");
    std::fs::write(&location, b"{ this is not json").unwrap();

    assert!(CacheStore::load(&location).is_empty());
}

#[test]
fn test_document_without_file_table_loads_empty() {
    let temp = TempDir::new().unwrap();
    let location = temp.path().join("lint.json");
    std::fs::write(&location, br#"[1, 2, 3]"#).unwrap();

    assert!(CacheStore::load(&location).is_empty());
}

#[test]
fn test_malformed_entries_are_dropped_individually() {
    let temp = TempDir::new().unwrap();
    let location = temp.path().join("lint.json");
    let document = r#"{
        "version": 1,
        "files": {
            "/src/good.js":     {"path": "/src/good.js", "modifiedAt": 100, "clean": true},
            "/src/missing.js":  {"path": "/src/missing.js", "clean": true},
            "/src/unknown.js":  {"path": "/src/unknown.js", "modifiedAt": 1, "clean": true, "extra": 1},
            "/src/badtype.js":  {"path": "/src/badtype.js", "modifiedAt": "yesterday", "clean": true},
            "/src/mismatch.js": {"path": "/src/other.js", "modifiedAt": 1, "clean": true}
        }
    }"#;
    std::fs::write(&location, document).unwrap();

    let store = CacheStore::load(&location);

    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get(Path::new("/src/good.js")),
        Some(&FileRecord::new(PathBuf::from("/src/good.js"), 100, true))
    );
    assert!(store.get(Path::new("/src/missing.js")).is_none());
}

#[test]
fn test_legacy_document_is_readable() {
    let temp = TempDir::new().unwrap();
    let location = temp.path().join("lint.json");
    let document = r#"{"files": {"/src/a.js": {"path": "/src/a.js", "updatedAt": 42, "linted": true}}}"#;
    std::fs::write(&location, document).unwrap();

    let store = CacheStore::load(&location);
    assert_eq!(
        store.get(Path::new("/src/a.js")),
        Some(&FileRecord::new(PathBuf::from("/src/a.js"), 42, true))
    );
}

#[test]
fn test_persisted_bytes_are_stable() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.json");
    let second = temp.path().join("second.json");

    let mut store = CacheStore::new();
    for i in 0..20 {
        store.put(FileRecord::new(PathBuf::from(format!("/src/f{i}.js")), i, i % 2 == 0));
    }
    store.persist(&first).unwrap();
    CacheStore::load(&first).persist(&second).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[cfg(unix)]
#[test]
fn test_persist_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    // A regular file where a directory is needed.
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let err = CacheStore::new()
        .persist(&blocker.join("lint.json"))
        .unwrap_err();
    assert!(err.to_string().contains("failed to persist cache"));
}
