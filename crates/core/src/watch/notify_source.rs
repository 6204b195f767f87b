use super::{ChangeEvent, ChangeKind, ChangeSource};
use crate::error::Result;
use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::Path;
use tokio::sync::mpsc;

/// Recursive `notify` subscription bridged onto a tokio channel.
///
/// Dropping it stops the underlying watcher.
pub struct NotifySource {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    queue: VecDeque<ChangeEvent>,
}

impl NotifySource {
    pub fn subscribe(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::info!("Started watching {}", root.display());

        Ok(Self {
            _watcher: watcher,
            rx,
            queue: VecDeque::new(),
        })
    }
}

#[async_trait]
impl ChangeSource for NotifySource {
    async fn next_event(&mut self) -> Option<ChangeEvent> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            match self.rx.recv().await? {
                Ok(event) => self.queue.extend(translate(event)),
                Err(e) => tracing::warn!("File watcher error: {}", e),
            }
        }
    }
}

/// Map a raw `notify` event onto change/add/remove.
///
/// Editors often save by renaming a temp file over the target, so a rename
/// into place counts as a content change.
fn translate(event: Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Add,
        EventKind::Remove(_) => ChangeKind::Remove,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Remove,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let from = paths.next().map(|p| ChangeEvent::new(ChangeKind::Remove, p));
            let to = paths.next().map(ChangeEvent::change);
            return from.into_iter().chain(to).collect();
        }
        EventKind::Modify(_) => ChangeKind::Change,
        _ => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| ChangeEvent::new(kind, path))
        .collect()
}
