pub mod batch;
pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod session;
pub mod util;
pub mod watch;

pub use error::{LintwatchError, Result};
