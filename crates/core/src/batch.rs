use crate::cache::{self, CacheStore};
use crate::classify::{Classification, classify};
use crate::engine::AnalysisEngine;
use crate::enumerate::FileEnumerator;
use crate::error::{LintwatchError, Result};
use crate::model::{BatchResult, FailureKind, FileFailure, FileOutcome, FileRecord, FileReport};
use crate::util::modified_millis;
use futures::stream::{self, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Upper bound on files analyzed at the same time.
    pub concurrency: usize,
    pub cache_path: PathBuf,
}

/// Runs classify -> analyze -> persist over one root.
pub struct BatchEvaluator {
    engine: Arc<dyn AnalysisEngine>,
    enumerator: Arc<dyn FileEnumerator>,
    options: BatchOptions,
}

impl BatchEvaluator {
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        enumerator: Arc<dyn FileEnumerator>,
        options: BatchOptions,
    ) -> Self {
        Self {
            engine,
            enumerator,
            options,
        }
    }

    /// Evaluate every dirty file under `root` and persist the updated store.
    ///
    /// Only enumeration failures abort the batch. Per-file read and engine
    /// failures are reported in the result and leave the file dirty.
    pub async fn evaluate(
        &self,
        root: &Path,
        ignore: &[String],
        store: &mut CacheStore,
    ) -> Result<BatchResult> {
        let candidates = self.enumerate(root, ignore).await?;

        let Classification {
            work_set,
            records,
            satisfied,
            missing,
        } = classify(&candidates, store);
        tracing::info!(
            "{} of {} files need analysis ({} up to date, {} vanished)",
            work_set.len(),
            candidates.len(),
            satisfied,
            missing
        );

        let jobs: Vec<FileRecord> = work_set
            .iter()
            .filter_map(|path| records.get(path).cloned())
            .collect();
        store.merge(records.into_values());

        let mut analyzed: Vec<(usize, FileReport)> = stream::iter(jobs.into_iter().enumerate())
            .map(|(idx, record)| async move { self.analyze_file(record).await.map(|r| (idx, r)) })
            .buffer_unordered(self.options.concurrency.max(1))
            .filter_map(|report| async move { report })
            .collect()
            .await;
        analyzed.sort_by_key(|(idx, _)| *idx);
        let files: Vec<FileReport> = analyzed.into_iter().map(|(_, report)| report).collect();

        store.merge(files.iter().map(|f| f.record.clone()));

        let cache_warning = match store.persist(&self.options.cache_path) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("{}", e);
                Some(e.to_string())
            }
        };

        let has_blocking_findings = files
            .iter()
            .map(FileReport::is_blocking)
            .fold(false, |acc, blocking| acc || blocking);

        let result = BatchResult {
            work_set,
            files,
            has_blocking_findings,
            cache_warning,
        };
        tracing::info!(
            "Batch done: {} files analyzed, {} errors, {} warnings, {} failed",
            result.files.len(),
            result.error_count(),
            result.warning_count(),
            result.failed_files().count()
        );
        Ok(result)
    }

    async fn enumerate(&self, root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
        let enumerator = Arc::clone(&self.enumerator);
        let root = root.to_path_buf();
        let ignore = ignore.to_vec();

        let mut candidates = tokio::task::spawn_blocking(move || enumerator.list(&root, &ignore))
            .await
            .map_err(|e| LintwatchError::Internal(e.to_string()))??;

        let temp_path = cache::temp_path(&self.options.cache_path);
        candidates.retain(|p| *p != self.options.cache_path && *p != temp_path);
        Ok(candidates)
    }

    /// `None` means the file disappeared after enumeration, which is not a failure.
    async fn analyze_file(&self, record: FileRecord) -> Option<FileReport> {
        let path = record.path.clone();

        // Stat before reading so the recorded timestamp can never be newer than the content.
        let modified_at = match tokio::fs::metadata(&path)
            .await
            .and_then(|m| modified_millis(&m))
        {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} vanished before analysis", path.display());
                return None;
            }
            Err(e) => return Some(failed(record, FailureKind::Read, e.to_string())),
        };

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} vanished before analysis", path.display());
                return None;
            }
            Err(e) => return Some(failed(record, FailureKind::Read, e.to_string())),
        };

        match self.engine.analyze(&path, &content).await {
            Ok(report) => {
                let record = FileRecord::new(path.clone(), modified_at, !report.has_errors());
                Some(FileReport {
                    path,
                    record,
                    outcome: FileOutcome::Analyzed(report),
                })
            }
            Err(e) => {
                tracing::warn!("Could not analyze {}: {}", path.display(), e);
                Some(failed(record, FailureKind::Analysis, e.to_string()))
            }
        }
    }
}

fn failed(record: FileRecord, kind: FailureKind, message: String) -> FileReport {
    let record = FileRecord {
        clean: false,
        ..record
    };
    FileReport {
        path: record.path.clone(),
        record,
        outcome: FileOutcome::Failed(FileFailure { kind, message }),
    }
}
