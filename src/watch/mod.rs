//! Debounced rebuild-on-change loop.
//!
//! [`ChangeWatcher`] consumes filesystem events from an [`EventSource`] and
//! runs a rebuild once the source has been quiet for a full debounce
//! window. Rebuilds run synchronously on the watcher's thread, so at most
//! one runs at a time.

mod notify_source;
mod registry;

pub use notify_source::NotifySource;
pub use registry::{ExclusionRules, WatchRegistry};

use crate::error::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Kind of a filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Modify,
    Remove,
}

/// One filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir_created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Create,
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Result of waiting on an [`EventSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    Events(Vec<FsEvent>),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The source shut down; no more events will arrive.
    Closed,
}

/// A stream of filesystem events over a growing set of directories.
pub trait EventSource {
    /// Wait up to `timeout` for events. `Duration::ZERO` never blocks.
    fn poll(&mut self, timeout: Duration) -> Result<Poll>;

    /// Start watching `root` and its subtree. Returns how many directories
    /// were newly registered.
    fn register_tree(&mut self, root: &std::path::Path) -> Result<usize>;
}

/// Where the watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    /// Changes recorded since the last rebuild.
    ChangesPending,
    /// Waiting for a quiet window before rebuilding.
    Debouncing,
    Running,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub runs: usize,
    pub failures: usize,
}

pub struct ChangeWatcher<S> {
    source: S,
    rules: ExclusionRules,
    debounce: Duration,
    state: WatchState,
}

impl<S: EventSource> ChangeWatcher<S> {
    pub fn new(source: S, rules: ExclusionRules, debounce: Duration) -> Self {
        Self {
            source,
            rules,
            debounce,
            state: WatchState::Idle,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Run until `stop` reads `true` or the source closes.
    ///
    /// A failed rebuild is logged and the loop keeps watching. The source,
    /// and any OS watch handles it owns, is dropped on return.
    pub fn run(
        mut self,
        stop: &watch::Receiver<bool>,
        mut rebuild: impl FnMut() -> anyhow::Result<()>,
    ) -> Result<WatchSummary> {
        let mut summary = WatchSummary::default();
        info!(
            "Watching for changes, rebuilding after {}ms of quiet",
            self.debounce.as_millis()
        );

        loop {
            if *stop.borrow() {
                info!("Stop requested, closing watcher");
                break;
            }
            if self.state == WatchState::ChangesPending {
                self.state = WatchState::Debouncing;
            }

            match self.source.poll(self.debounce)? {
                Poll::Closed => {
                    debug!("Event source closed");
                    break;
                }
                Poll::Events(events) => {
                    if self.absorb(events) {
                        self.state = WatchState::ChangesPending;
                    }
                }
                Poll::Timeout if self.state == WatchState::Debouncing => {
                    self.state = WatchState::Running;
                    info!("Changes detected, rebuilding");
                    summary.runs += 1;
                    if let Err(e) = rebuild() {
                        summary.failures += 1;
                        warn!("Rebuild failed: {:#}", e);
                    }
                    let (changed, closed) = self.drain()?;
                    self.state = if changed {
                        WatchState::ChangesPending
                    } else {
                        WatchState::Idle
                    };
                    if closed {
                        break;
                    }
                }
                Poll::Timeout => {}
            }
        }
        Ok(summary)
    }

    /// Collect whatever arrived while a rebuild ran.
    fn drain(&mut self) -> Result<(bool, bool)> {
        let mut changed = false;
        loop {
            match self.source.poll(Duration::ZERO)? {
                Poll::Events(events) => changed |= self.absorb(events),
                Poll::Timeout => return Ok((changed, false)),
                Poll::Closed => return Ok((changed, true)),
            }
        }
    }

    /// Record events; returns whether any of them counts as a change.
    fn absorb(&mut self, events: Vec<FsEvent>) -> bool {
        let mut changed = false;
        for event in events {
            if self.rules.is_excluded(&event.path) {
                continue;
            }
            if event.kind == FsEventKind::Create && event.is_dir {
                match self.source.register_tree(&event.path) {
                    Ok(0) => continue,
                    Ok(added) => debug!(
                        "Registered {} new directories under {}",
                        added,
                        event.path.display()
                    ),
                    Err(e) => {
                        warn!("Unable to watch {}: {}", event.path.display(), e);
                        continue;
                    }
                }
            }
            debug!("{:?} {}", event.kind, event.path.display());
            changed = true;
        }
        changed
    }
}
