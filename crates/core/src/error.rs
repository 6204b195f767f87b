use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LintwatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot enumerate files under {}: {reason}", root.display())]
    Enumeration { root: PathBuf, reason: String },
    #[error("failed to watch for file changes: {0}")]
    WatchSubscription(#[from] notify::Error),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the durable cache record.
///
/// `Read` and `Parse` never leave `CacheStore::load`; they are logged and the
/// store starts empty.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read cache {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse cache {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to persist cache {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("I/O error talking to the analysis engine: {0}")]
    Io(#[from] std::io::Error),
    #[error("analysis engine exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },
    #[error("unreadable analysis engine output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LintwatchError>;
