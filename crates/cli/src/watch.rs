use crate::reporter::TerminalReporter;
use crate::RunArgs;
use lintwatch_core::engine::CommandEngine;
use lintwatch_core::enumerate::WalkEnumerator;
use lintwatch_core::session::LintSession;
use lintwatch_core::watch::{NotifySource, StopReason, WatchLoop, WatchOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(args: RunArgs, debounce: Duration) -> Result<bool, Box<dyn std::error::Error>> {
    let config = args.to_config()?.with_debounce(debounce);
    let reporter = TerminalReporter::new(config.root.clone(), args.warnings);

    let source = NotifySource::subscribe(&config.root)?;
    info!("File watcher started at: {}.", config.root.display());
    info!("Press Ctrl+C to stop.");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
        signal_token.cancel();
    });

    let options = WatchOptions::from_config(&config);
    let standard_filters = config.standard_filters;
    let engine = Arc::new(CommandEngine::new(config.engine.clone()));
    let mut session = LintSession::open(config, engine, Arc::new(WalkEnumerator::new(standard_filters)));

    let summary = WatchLoop::new(options)
        .run(&mut session, source, &reporter, cancel)
        .await?;

    match summary.stop {
        StopReason::Cancelled => info!("Watcher stopped after {} runs.", summary.batches),
        StopReason::SourceClosed => warn!("File watcher closed after {} runs.", summary.batches),
    }
    Ok(true)
}
