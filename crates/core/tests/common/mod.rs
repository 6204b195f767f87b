#![allow(dead_code)]

use async_trait::async_trait;
use lintwatch_core::config::RunnerConfig;
use lintwatch_core::engine::AnalysisEngine;
use lintwatch_core::error::{EngineError, LintwatchError};
use lintwatch_core::model::{AnalysisReport, BatchResult, Finding};
use lintwatch_core::report::Reporter;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Engine driven by markers in the file content:
/// a line containing `ERROR` yields an error, `WARN` a warning,
/// and `CRASH` anywhere makes the engine fail.
#[derive(Default)]
pub struct ScriptedEngine {
    pub calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedEngine {
    pub fn analyzed(&self) -> Vec<PathBuf> {
        let mut calls = self.calls.lock().expect("lock poisoned").clone();
        calls.sort();
        calls
    }

    pub fn reset(&self) {
        self.calls.lock().expect("lock poisoned").clear();
    }
}

#[async_trait]
impl AnalysisEngine for ScriptedEngine {
    async fn analyze(&self, path: &Path, content: &str) -> Result<AnalysisReport, EngineError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(path.to_path_buf());

        if content.contains("CRASH") {
            return Err(EngineError::Exited {
                status: "exit status: 2".to_string(),
                stderr: "engine crashed".to_string(),
            });
        }

        let findings = content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let line_no = i as u32 + 1;
                if line.contains("ERROR") {
                    Some(Finding::error(line_no, 1, "forbidden marker").with_rule("no-error"))
                } else if line.contains("WARN") {
                    Some(Finding::warning(line_no, 1, "suspicious marker"))
                } else {
                    None
                }
            })
            .collect();
        Ok(AnalysisReport::from_findings(findings))
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub started: Mutex<Vec<Vec<PathBuf>>>,
    pub finished: Mutex<Vec<BatchResult>>,
    pub failed: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn finished_count(&self) -> usize {
        self.finished.lock().expect("lock poisoned").len()
    }
}

impl Reporter for RecordingReporter {
    fn batch_started(&self, trigger: &[PathBuf]) {
        self.started
            .lock()
            .expect("lock poisoned")
            .push(trigger.to_vec());
    }

    fn batch_finished(&self, result: &BatchResult) {
        self.finished
            .lock()
            .expect("lock poisoned")
            .push(result.clone());
    }

    fn batch_failed(&self, error: &LintwatchError) {
        self.failed
            .lock()
            .expect("lock poisoned")
            .push(error.to_string());
    }
}

/// Write `content` to `path` and pin its modification time.
pub fn write_at(path: &Path, content: &str, millis: u64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    set_mtime(path, millis);
}

pub fn set_mtime(path: &Path, millis: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_millis(millis))
        .unwrap();
}

/// Config rooted at `root` with the cache kept outside of it.
pub fn test_config(root: &Path, cache_dir: &Path) -> RunnerConfig {
    RunnerConfig::new(root)
        .with_cache_path(cache_dir.join("lint.json"))
        .with_concurrency(4)
        .with_debounce(Duration::ZERO)
}
