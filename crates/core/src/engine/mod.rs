//! Seam to the external static-analysis engine.
//!
//! The core only needs `content -> report`. Whether an engine supports
//! custom rules or plugins is its own business.

mod command;

pub use command::{CommandEngine, EngineCommand, parse_eslint_report};

use crate::error::EngineError;
use crate::model::AnalysisReport;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Analyze `content`. `path` is a hint for engines that pick rules by file name.
    async fn analyze(&self, path: &Path, content: &str) -> Result<AnalysisReport, EngineError>;
}
