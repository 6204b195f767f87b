use crate::reporter::TerminalReporter;
use crate::RunArgs;
use lintwatch_core::engine::CommandEngine;
use lintwatch_core::enumerate::WalkEnumerator;
use lintwatch_core::report::Reporter;
use lintwatch_core::session::LintSession;
use std::sync::Arc;
use tracing::info;

pub async fn run(args: RunArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    let reporter = TerminalReporter::new(config.root.clone(), args.warnings);

    info!(
        "Linting {} (cache: {})...",
        config.root.display(),
        config.cache_path.display()
    );
    let standard_filters = config.standard_filters;
    let engine = Arc::new(CommandEngine::new(config.engine.clone()));
    let mut session =
        LintSession::open(config, engine, Arc::new(WalkEnumerator::new(standard_filters)));

    match session.run_batch().await {
        Ok(result) => {
            reporter.batch_finished(&result);
            info!(
                "Lint finished: {} analyzed, {} errors, {} warnings.",
                result.files.len(),
                result.error_count(),
                result.warning_count()
            );
            Ok(result.is_clean())
        }
        Err(e) => {
            // Already shown to the user; only the exit code remains.
            reporter.batch_failed(&e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(path: std::path::PathBuf, cache: std::path::PathBuf) -> RunArgs {
        RunArgs {
            path: Some(path),
            cache: Some(cache),
            ignore: Vec::new(),
            no_default_ignore: false,
            jobs: Some(1),
            engine: None,
            all_files: false,
            warnings: false,
        }
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_a_failed_run_not_an_error() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("lint.json");

        let clean = run(args(temp.path().join("missing"), cache.clone()))
            .await
            .unwrap();

        assert!(!clean);
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn test_empty_tree_is_clean() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("src");
        std::fs::create_dir_all(&root).unwrap();
        let cache = temp.path().join("lint.json");

        assert!(run(args(root, cache.clone())).await.unwrap());
        assert!(cache.exists());
    }
}
