//! File watcher (§4.9 "Realtime strategy"): wraps `notify`, debounces
//! bursts per path, and waits for a write-finish stability window before
//! handing an event to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glimpse_domain::PollingHints;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebouncedEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How long a burst of events on the same path is coalesced into one.
    pub debounce: Duration,
    /// How long a file's size must hold steady before it's considered
    /// finished writing.
    pub stability_window: Duration,
    pub stability_poll: Duration,
    pub max_restarts: u32,
    pub restart_backoff: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            stability_window: Duration::from_millis(500),
            stability_poll: Duration::from_millis(100),
            max_restarts: 3,
            restart_backoff: Duration::from_secs(5),
        }
    }
}

impl WatcherConfig {
    /// Widens the stability poll interval for volumes that need polling
    /// fallback (case-insensitive filesystems, network shares).
    pub fn with_polling_hints(mut self, hints: PollingHints) -> Self {
        self.stability_poll = Duration::from_millis(hints.text_interval_ms);
        self
    }
}

fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

/// Debounced, restart-on-error file watcher. Runs its own background task;
/// dropping the returned receiver stops the watcher.
pub struct DebouncedWatcher {
    root: PathBuf,
    config: WatcherConfig,
}

impl DebouncedWatcher {
    pub fn new(root: impl Into<PathBuf>, config: WatcherConfig) -> Self {
        Self { root: root.into(), config }
    }

    /// Spawns the watcher and returns a receiver of debounced, stability-
    /// checked events. Watcher failures are retried up to
    /// `config.max_restarts` times with `config.restart_backoff` between
    /// attempts; after that the task exits and the channel closes, never
    /// panicking the process (§4.9 "never crash the host process").
    pub fn spawn(self) -> mpsc::Receiver<DebouncedEvent> {
        let (out_tx, out_rx) = mpsc::channel(1024);
        tokio::spawn(async move {
            let mut restarts = 0u32;
            loop {
                match self.run_once(&out_tx).await {
                    Ok(()) => break,
                    Err(err) if restarts < self.config.max_restarts => {
                        restarts += 1;
                        warn!(
                            "file watcher failed ({err}), restarting ({restarts}/{})",
                            self.config.max_restarts
                        );
                        tokio::time::sleep(self.config.restart_backoff).await;
                    }
                    Err(err) => {
                        error!("file watcher exhausted restarts, giving up: {err}");
                        break;
                    }
                }
            }
        });
        out_rx
    }

    async fn run_once(&self, out_tx: &mpsc::Sender<DebouncedEvent>) -> Result<(), notify::Error> {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher: RecommendedWatcher = recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = raw_tx.send(event);
            }
            Err(err) => error!("notify backend error: {err}"),
        })?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        info!("watching {:?}", self.root);

        let mut pending: HashMap<PathBuf, (ChangeKind, Instant)> = HashMap::new();
        let mut tick = tokio::time::interval(self.config.debounce);

        loop {
            tokio::select! {
                maybe_event = raw_rx.recv() => {
                    let Some(event) = maybe_event else { return Ok(()) };
                    let Some(kind) = classify(&event.kind) else { continue };
                    for path in event.paths {
                        debug!("raw event {:?} on {:?}", kind, path);
                        pending.insert(path, (kind, Instant::now()));
                    }
                }
                _ = tick.tick() => {
                    let ready: Vec<PathBuf> = pending
                        .iter()
                        .filter(|(_, (_, seen))| seen.elapsed() >= self.config.debounce)
                        .map(|(path, _)| path.clone())
                        .collect();

                    for path in ready {
                        let Some((kind, _)) = pending.remove(&path) else { continue };
                        if kind != ChangeKind::Removed && !self.wait_for_stability(&path).await {
                            continue;
                        }
                        if out_tx.send(DebouncedEvent { path, kind }).await.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Polls file size until it holds steady for `stability_window`, or
    /// gives up if the file vanished mid-write.
    async fn wait_for_stability(&self, path: &Path) -> bool {
        let mut last_size = None;
        let mut stable_since = Instant::now();
        loop {
            let size = match tokio::fs::metadata(path).await {
                Ok(meta) => meta.len(),
                Err(_) => return false,
            };
            if Some(size) != last_size {
                last_size = Some(size);
                stable_since = Instant::now();
            }
            if stable_since.elapsed() >= self.config.stability_window {
                return true;
            }
            tokio::time::sleep(self.config.stability_poll).await;
        }
    }
}
