use crate::batch::{BatchEvaluator, BatchOptions};
use crate::cache::CacheStore;
use crate::config::RunnerConfig;
use crate::engine::AnalysisEngine;
use crate::enumerate::FileEnumerator;
use crate::error::Result;
use crate::model::BatchResult;
use std::sync::Arc;

/// One process invocation or watch session: a loaded store plus the evaluator
/// that owns it while a batch runs.
pub struct LintSession {
    config: RunnerConfig,
    store: CacheStore,
    evaluator: BatchEvaluator,
}

impl LintSession {
    /// Load the cache (fail-open) and wire up the evaluator.
    pub fn open(
        config: RunnerConfig,
        engine: Arc<dyn AnalysisEngine>,
        enumerator: Arc<dyn FileEnumerator>,
    ) -> Self {
        let store = CacheStore::load(&config.cache_path);
        let evaluator = BatchEvaluator::new(
            engine,
            enumerator,
            BatchOptions {
                concurrency: config.concurrency,
                cache_path: config.cache_path.clone(),
            },
        );
        Self {
            config,
            store,
            evaluator,
        }
    }

    pub async fn run_batch(&mut self) -> Result<BatchResult> {
        self.evaluator
            .evaluate(&self.config.root, &self.config.ignore, &mut self.store)
            .await
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}
