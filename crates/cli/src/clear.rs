use lintwatch_core::cache::CacheStore;
use lintwatch_core::config::RunnerConfig;
use std::path::PathBuf;
use tracing::info;

pub fn run(path: Option<PathBuf>, cache: Option<PathBuf>) -> Result<bool, Box<dyn std::error::Error>> {
    let cache_path = match cache {
        Some(cache) => cache,
        None => {
            let root = match path {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            RunnerConfig::new(root).cache_path
        }
    };

    info!("Clearing lint cache at: {}...", cache_path.display());
    if CacheStore::clear(&cache_path)? {
        info!("Lint cache cleared.");
    } else {
        info!("No lint cache found.");
    }
    Ok(true)
}
