//! [`EventSource`] backed by the platform watcher from `notify`.

use super::registry::{ExclusionRules, WatchRegistry};
use super::{EventSource, FsEvent, FsEventKind, Poll};
use crate::error::{PackagerError, Result};
use notify::event::{CreateKind, ModifyKind};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::warn;

/// Watches each registered directory non-recursively; new directories are
/// added as their create events arrive.
pub struct NotifySource {
    watcher: RecommendedWatcher,
    registry: WatchRegistry,
    events: Receiver<notify::Result<notify::Event>>,
}

impl NotifySource {
    pub fn new(rules: ExclusionRules) -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;
        Ok(Self {
            watcher,
            registry: WatchRegistry::new(rules),
            events,
        })
    }

    /// Number of directories currently watched.
    pub fn watched(&self) -> usize {
        self.registry.len()
    }
}

impl EventSource for NotifySource {
    fn poll(&mut self, timeout: Duration) -> Result<Poll> {
        let first = match self.events.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => return Ok(Poll::Timeout),
            Err(RecvTimeoutError::Disconnected) => return Ok(Poll::Closed),
        };

        let mut batch = Vec::new();
        let mut pending = Some(first);
        while let Some(result) = pending.take() {
            match result {
                Ok(event) => convert(event, &mut batch),
                Err(e) => warn!("File watcher error: {}", e),
            }
            pending = self.events.try_recv().ok();
        }
        Ok(Poll::Events(batch))
    }

    fn register_tree(&mut self, root: &Path) -> Result<usize> {
        let watcher = &mut self.watcher;
        self.registry.refresh_tree(root, |dir| {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(PackagerError::from)
        })
    }
}

/// Map a `notify` event onto zero or more [`FsEvent`]s.
///
/// Renames are reported by the new path's existence: a directory that
/// appears is treated as created so its subtree gets registered.
fn convert(event: notify::Event, out: &mut Vec<FsEvent>) {
    for path in event.paths {
        let converted = match event.kind {
            EventKind::Create(CreateKind::Folder) => FsEvent::dir_created(path),
            EventKind::Create(_) if path.is_dir() => FsEvent::dir_created(path),
            EventKind::Create(_) => FsEvent::new(FsEventKind::Create, path),
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.is_dir() {
                    FsEvent::dir_created(path)
                } else if path.exists() {
                    FsEvent::new(FsEventKind::Create, path)
                } else {
                    FsEvent::new(FsEventKind::Remove, path)
                }
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => continue,
            EventKind::Modify(_) => FsEvent::new(FsEventKind::Modify, path),
            EventKind::Remove(_) => FsEvent::new(FsEventKind::Remove, path),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => continue,
        };
        out.push(converted);
    }
}
