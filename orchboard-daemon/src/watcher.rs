//! Change watcher: polls the coordination file and broadcasts on change.
//!
//! Every wake-up, whether from the poll interval or a filesystem event,
//! funnels through [`ChangeWatcher::tick`], which only yields sections when
//! the file's stamp differs from the last one seen.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;

use orchboard_core::{document, parse, BoardError, SectionSet};

use crate::broadcast::Broadcaster;
use crate::error::DaemonError;

/// What the watcher remembers about the file between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: SystemTime,
    pub len: u64,
}

impl FileStamp {
    fn of(metadata: &fs::Metadata) -> std::io::Result<Self> {
        Ok(Self {
            modified: metadata.modified()?,
            len: metadata.len(),
        })
    }
}

#[derive(Debug)]
pub struct ChangeWatcher {
    path: PathBuf,
    last_seen: Option<FileStamp>,
}

impl ChangeWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_seen: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_seen(&self) -> Option<FileStamp> {
        self.last_seen
    }

    /// Inspect the file once. Returns the sections to broadcast, if any.
    pub fn tick(&mut self) -> Option<SectionSet> {
        let stamp = fs::metadata(&self.path).and_then(|m| FileStamp::of(&m));
        match stamp {
            Ok(stamp) if self.last_seen == Some(stamp) => None,
            Ok(stamp) => match document::load(&self.path) {
                Ok(text) => {
                    self.last_seen = Some(stamp);
                    tracing::debug!(path = %self.path.display(), "orchestrator file changed");
                    Some(parse(&text))
                }
                // Stamp stays put so the next tick retries the read.
                Err(err) => {
                    let source = match err {
                        BoardError::Io { source, .. } => source,
                        other => std::io::Error::new(ErrorKind::Other, other.to_string()),
                    };
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %source,
                        "failed to read orchestrator file",
                    );
                    Some(SectionSet::unavailable(&self.path, &source))
                }
            },
            // Stamp stays put so the file's reappearance reads as a change.
            Err(err) if err.kind() == ErrorKind::NotFound => Some(SectionSet::missing(&self.path)),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to stat orchestrator file",
                );
                Some(SectionSet::unavailable(&self.path, &err))
            }
        }
    }
}

/// Filesystem events for the file's directory, used only to wake the loop early.
struct HintSource {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_name: OsString,
}

impl HintSource {
    fn start(path: &Path) -> Result<Self, DaemonError> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| DaemonError::Protocol(format!("not a file path: {}", path.display())))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, events) = mpsc::unbounded_channel();
        let mut watcher = recommended_watcher(move |event| {
            let _ = event_tx.send(event);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %dir.display(), "watching orchestrator directory");

        Ok(Self {
            _watcher: watcher,
            events,
            file_name,
        })
    }

    fn touches_file(&self, event: &Event) -> bool {
        event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(self.file_name.as_os_str()))
    }
}

async fn next_hint(hints: &mut Option<HintSource>) -> bool {
    let Some(source) = hints.as_mut() else {
        return std::future::pending().await;
    };
    match source.events.recv().await {
        Some(Ok(event)) => source.touches_file(&event),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "watcher event error");
            false
        }
        None => std::future::pending().await,
    }
}

/// Poll `watcher` every `interval` until shutdown, publishing each change.
pub async fn watcher_task(
    mut watcher: ChangeWatcher,
    broadcaster: Broadcaster,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut hints = match HintSource::start(watcher.path()) {
        Ok(source) => Some(source),
        Err(err) => {
            tracing::warn!(error = %err, "filesystem notifications unavailable, polling only");
            None
        }
    };

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        path = %watcher.path().display(),
        interval_ms = interval.as_millis() as u64,
        "watching orchestrator file",
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {}
            relevant = next_hint(&mut hints) => {
                if !relevant {
                    continue;
                }
            }
        }

        if let Some(sections) = watcher.tick() {
            let viewers = broadcaster.publish(sections);
            tracing::debug!(viewers, "watcher broadcast orchestrator update");
        }
    }

    Ok(())
}
