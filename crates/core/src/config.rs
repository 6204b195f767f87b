use crate::engine::EngineCommand;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the cache location when set.
pub const CACHE_ENV_VAR: &str = "LINTWATCH_CACHE";
pub const DEFAULT_CACHE_FILE: &str = ".cache/lint.json";
pub const DEFAULT_IGNORE: &[&str] = &["*.json", "*.html", "*.css", ".DS_Store", "node_modules/"];
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Canonical source root.
    pub root: PathBuf,
    pub cache_path: PathBuf,
    pub ignore: Vec<String>,
    pub concurrency: usize,
    pub engine: EngineCommand,
    pub debounce: Duration,
    /// Skip hidden files and VCS-ignored files, like `git` would.
    pub standard_filters: bool,
}

impl RunnerConfig {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = absolute(root.as_ref());
        let root = root.canonicalize().unwrap_or(root);
        let cache_path = std::env::var_os(CACHE_ENV_VAR)
            .map(|p| absolute(Path::new(&p)))
            .unwrap_or_else(|| root.join(DEFAULT_CACHE_FILE));

        Self {
            root,
            cache_path,
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            engine: EngineCommand::default(),
            debounce: DEFAULT_DEBOUNCE,
            standard_filters: true,
        }
    }

    pub fn with_cache_path(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_path = absolute(path.as_ref());
        self
    }

    /// Replace the default ignore list.
    pub fn with_ignore(mut self, patterns: Vec<String>) -> Self {
        self.ignore = patterns;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_engine(mut self, engine: EngineCommand) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_standard_filters(mut self, enabled: bool) -> Self {
        self.standard_filters = enabled;
        self
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_hang_off_the_root() {
        let temp = TempDir::new().unwrap();
        let config = RunnerConfig::new(temp.path());
        let root = temp.path().canonicalize().unwrap();

        assert_eq!(config.root, root);
        if std::env::var_os(CACHE_ENV_VAR).is_none() {
            assert_eq!(config.cache_path, root.join(DEFAULT_CACHE_FILE));
        }
        assert!(config.ignore.iter().any(|p| p == "*.json"));
        assert!(config.concurrency >= 1);
        assert!(config.standard_filters);
    }

    #[test]
    fn test_builders_override_defaults() {
        let temp = TempDir::new().unwrap();
        let config = RunnerConfig::new(temp.path())
            .with_cache_path(temp.path().join("state.json"))
            .with_ignore(vec!["dist/".to_string()])
            .with_concurrency(0)
            .with_debounce(Duration::ZERO)
            .with_standard_filters(false);

        assert_eq!(config.cache_path, temp.path().join("state.json"));
        assert_eq!(config.ignore, vec!["dist/".to_string()]);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.debounce, Duration::ZERO);
        assert!(!config.standard_filters);
    }
}
