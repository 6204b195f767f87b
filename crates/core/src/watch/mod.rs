//! Watch-triggered re-evaluation.
//!
//! The loop alternates between Idle (waiting for a relevant change) and
//! Evaluating (one batch in flight). Changes seen while evaluating are folded
//! into a single follow-up batch, so batches never overlap and no change is
//! left unobserved.

mod notify_source;

pub use notify_source::NotifySource;

use crate::config::RunnerConfig;
use crate::cache;
use crate::enumerate::{PathFilter, StandardFilter};
use crate::error::{LintwatchError, Result};
use crate::report::Reporter;
use crate::session::LintSession;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Content modified.
    Change,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Change, path)
    }
}

/// Stream of filesystem changes. `None` means the stream has ended.
///
/// `next_event` must be cancel safe: the loop drops pending calls whenever
/// another branch wins.
#[async_trait]
pub trait ChangeSource: Send {
    async fn next_event(&mut self) -> Option<ChangeEvent>;
}

#[async_trait]
impl ChangeSource for mpsc::UnboundedReceiver<ChangeEvent> {
    async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.recv().await
    }
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period absorbed after the first change before a batch starts.
    pub debounce: Duration,
    /// Run one batch before waiting for changes.
    pub initial_batch: bool,
}

impl WatchOptions {
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            debounce: config.debounce,
            initial_batch: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    SourceClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSummary {
    pub batches: usize,
    pub stop: StopReason,
}

/// Decides which events should trigger a batch.
struct Relevance {
    filter: PathFilter,
    standard: Option<StandardFilter>,
    cache_path: PathBuf,
    temp_path: PathBuf,
}

impl Relevance {
    fn new(config: &RunnerConfig) -> Result<Self> {
        let filter = PathFilter::new(&config.root, &config.ignore)
            .map_err(|e| LintwatchError::Internal(format!("invalid ignore pattern: {e}")))?;
        Ok(Self {
            filter,
            standard: config
                .standard_filters
                .then(|| StandardFilter::new(&config.root)),
            cache_path: config.cache_path.clone(),
            temp_path: cache::temp_path(&config.cache_path),
        })
    }

    fn is_relevant(&self, path: &Path) -> bool {
        if path == self.cache_path || path == self.temp_path {
            return false;
        }
        let is_dir = path.is_dir();
        !self.filter.is_ignored(path, is_dir)
            && !self
                .standard
                .as_ref()
                .is_some_and(|standard| standard.is_ignored(path, is_dir))
    }

    /// The path to re-evaluate for, if this event calls for a batch.
    fn trigger(&self, event: ChangeEvent) -> Option<PathBuf> {
        if !self.is_relevant(&event.path) {
            tracing::trace!("Ignoring {:?} on {}", event.kind, event.path.display());
            return None;
        }
        match event.kind {
            ChangeKind::Change if !event.path.is_dir() => Some(event.path),
            ChangeKind::Change => None,
            ChangeKind::Add | ChangeKind::Remove => {
                // The next enumeration sees the new path set.
                tracing::debug!("{:?} {}", event.kind, event.path.display());
                None
            }
        }
    }
}

pub struct WatchLoop {
    options: WatchOptions,
}

impl WatchLoop {
    pub fn new(options: WatchOptions) -> Self {
        Self { options }
    }

    /// Run until `cancel` fires or `source` ends.
    ///
    /// An in-flight batch always runs to completion, so the cache file is
    /// never abandoned mid-write. `source` is dropped on return, which
    /// releases the underlying subscription.
    pub async fn run<S: ChangeSource>(
        &self,
        session: &mut LintSession,
        mut source: S,
        reporter: &dyn Reporter,
        cancel: CancellationToken,
    ) -> Result<WatchSummary> {
        let relevance = Relevance::new(session.config())?;
        let mut batches = 0usize;
        let mut source_open = true;
        // Some(_) while a batch is owed; holds the paths that asked for it.
        let mut pending: Option<BTreeSet<PathBuf>> =
            self.options.initial_batch.then(BTreeSet::new);

        let stop = loop {
            // Idle
            if pending.is_none() {
                if !source_open {
                    break StopReason::SourceClosed;
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break StopReason::Cancelled,
                    event = source.next_event() => match event {
                        Some(event) => {
                            if let Some(path) = relevance.trigger(event) {
                                pending.get_or_insert_with(BTreeSet::new).insert(path);
                            }
                        }
                        None => source_open = false,
                    },
                }
                if pending.is_none() {
                    continue;
                }
                self.absorb_burst(&mut source, &mut source_open, &relevance, &mut pending, &cancel)
                    .await;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            // Evaluating
            let trigger: Vec<PathBuf> = pending.take().unwrap_or_default().into_iter().collect();
            if !trigger.is_empty() {
                tracing::info!("Detected changes in {} files. Re-evaluating...", trigger.len());
            }
            reporter.batch_started(&trigger);
            batches += 1;

            let batch = session.run_batch();
            tokio::pin!(batch);
            let outcome = loop {
                tokio::select! {
                    // Drain queued changes before accepting completion so they
                    // fold into exactly one follow-up batch.
                    biased;
                    event = source.next_event(), if source_open => match event {
                        Some(event) => {
                            if let Some(path) = relevance.trigger(event) {
                                pending.get_or_insert_with(BTreeSet::new).insert(path);
                            }
                        }
                        None => source_open = false,
                    },
                    outcome = &mut batch => break outcome,
                }
            };

            match outcome {
                Ok(result) => reporter.batch_finished(&result),
                Err(e) => {
                    tracing::error!("Batch failed: {}", e);
                    reporter.batch_failed(&e);
                }
            }
        };

        tracing::info!("Watch loop stopped ({:?}) after {} batches", stop, batches);
        Ok(WatchSummary { batches, stop })
    }

    async fn absorb_burst<S: ChangeSource>(
        &self,
        source: &mut S,
        source_open: &mut bool,
        relevance: &Relevance,
        pending: &mut Option<BTreeSet<PathBuf>>,
        cancel: &CancellationToken,
    ) {
        if self.options.debounce.is_zero() {
            return;
        }
        let quiet = tokio::time::sleep(self.options.debounce);
        tokio::pin!(quiet);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = &mut quiet => return,
                event = source.next_event(), if *source_open => match event {
                    Some(event) => {
                        if let Some(path) = relevance.trigger(event) {
                            pending.get_or_insert_with(BTreeSet::new).insert(path);
                        }
                    }
                    None => *source_open = false,
                },
            }
        }
    }
}
