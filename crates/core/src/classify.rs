use crate::cache::CacheStore;
use crate::model::FileRecord;
use crate::util::modified_millis;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Which candidates need analysis, and the records to merge before analyzing them.
#[derive(Debug, Default)]
pub struct Classification {
    /// Dirty paths in candidate order.
    pub work_set: Vec<PathBuf>,
    /// Updated record for every candidate still on disk.
    pub records: HashMap<PathBuf, FileRecord>,
    /// Candidates already clean at their current timestamp.
    pub satisfied: usize,
    /// Candidates that vanished before they could be stat'ed.
    pub missing: usize,
}

pub fn classify(candidates: &[PathBuf], store: &CacheStore) -> Classification {
    let mut out = Classification::default();

    for path in candidates {
        let live = fs::metadata(path).and_then(|m| modified_millis(&m));
        let live = match live {
            Ok(t) => Some(t),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Stale records are kept; see DESIGN.md.
                out.missing += 1;
                continue;
            }
            Err(e) => {
                tracing::debug!("Cannot stat {}: {}", path.display(), e);
                None
            }
        };

        let (record, dirty) = match (store.get(path), live) {
            (None, live) => (FileRecord::unverified(path.clone(), live.unwrap_or(0)), true),
            (Some(stored), Some(live)) if live > stored.modified_at => {
                (FileRecord::unverified(path.clone(), live), true)
            }
            (Some(stored), None) => (FileRecord { clean: false, ..stored.clone() }, true),
            (Some(stored), Some(_)) => (stored.clone(), !stored.clean),
        };

        if dirty {
            out.work_set.push(path.clone());
        } else {
            out.satisfied += 1;
        }
        out.records.insert(path.clone(), record);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, millis: u64) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_millis(millis))
            .unwrap();
    }

    #[test]
    fn test_unseen_files_are_dirty() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.js");
        touch(&a, 100);

        let result = classify(&[a.clone()], &CacheStore::new());

        assert_eq!(result.work_set, vec![a.clone()]);
        assert_eq!(result.records[&a], FileRecord::unverified(a, 100));
    }

    #[test]
    fn test_clean_and_unchanged_is_satisfied() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.js");
        let b = temp.path().join("b.js");
        touch(&a, 100);
        touch(&b, 100);

        let mut store = CacheStore::new();
        store.put(FileRecord::new(a.clone(), 100, true));

        let result = classify(&[a.clone(), b.clone()], &store);

        assert_eq!(result.work_set, vec![b]);
        assert_eq!(result.satisfied, 1);
        assert_eq!(result.records[&a], FileRecord::new(a, 100, true));
    }

    #[test]
    fn test_newer_timestamp_invalidates_clean() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.js");
        touch(&a, 150);

        let mut store = CacheStore::new();
        store.put(FileRecord::new(a.clone(), 100, true));

        let result = classify(&[a.clone()], &store);

        assert_eq!(result.work_set, vec![a.clone()]);
        assert_eq!(result.records[&a], FileRecord::unverified(a, 150));
    }

    #[test]
    fn test_unclean_record_stays_dirty() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.js");
        touch(&a, 100);

        let mut store = CacheStore::new();
        store.put(FileRecord::new(a.clone(), 100, false));

        let result = classify(&[a.clone()], &store);
        assert_eq!(result.work_set, vec![a]);
    }

    #[test]
    fn test_vanished_file_is_skipped_and_record_kept() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("gone.js");

        let mut store = CacheStore::new();
        store.put(FileRecord::new(gone.clone(), 100, false));

        let result = classify(&[gone.clone()], &store);

        assert!(result.work_set.is_empty());
        assert!(result.records.is_empty());
        assert_eq!(result.missing, 1);
        assert!(store.get(&gone).is_some());
    }
}
