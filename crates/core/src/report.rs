use crate::error::LintwatchError;
use crate::model::BatchResult;
use std::path::PathBuf;

/// Sink for batch outcomes. Implementations decide how anything is shown.
pub trait Reporter: Send + Sync {
    /// A watch-triggered batch is about to run for these changed paths.
    fn batch_started(&self, _trigger: &[PathBuf]) {}

    fn batch_finished(&self, result: &BatchResult);

    /// The batch could not run at all, e.g. the root could not be enumerated.
    fn batch_failed(&self, error: &LintwatchError);
}
