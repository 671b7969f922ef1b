//! Strategy orchestration (§4.9): `Realtime`/`Lazy`/`Git` implementations of
//! a common lifecycle, switched at runtime by an `Orchestrator` that always
//! flushes the outgoing strategy before starting the next one.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use glimpse_domain::{GlimpseError, Result, StrategyName, StrategyState, StrategyStats};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::pipeline::{Pipeline, SourceFile};
use crate::watcher::{ChangeKind, DebouncedWatcher, WatcherConfig};

#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> StrategyName;
    async fn initialize(&mut self) -> Result<()>;
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    fn is_active(&self) -> bool;
    async fn on_file_event(&mut self, path: PathBuf, kind: ChangeKind) -> Result<()>;
    /// Drains whatever work is buffered; a no-op for strategies with nothing
    /// to batch.
    async fn flush(&mut self) -> Result<()>;
    fn stats(&self) -> StrategyStats;

    /// Hands over the strategy's own filesystem-event source, if it owns
    /// one, so a driving loop can feed events into `on_file_event` itself.
    /// Only `RealtimeStrategy` watches the filesystem directly; the default
    /// is `None`.
    fn take_watch_events(&mut self) -> Option<tokio::sync::mpsc::Receiver<crate::watcher::DebouncedEvent>> {
        None
    }
}

struct StrategyShared {
    pipeline: Arc<Pipeline>,
    root: PathBuf,
    fingerprints: Arc<Mutex<glimpse_domain::FingerprintMap>>,
    processed_files: usize,
    last_activity: Option<chrono::DateTime<Utc>>,
}

impl StrategyShared {
    async fn handle(&mut self, path: PathBuf, kind: ChangeKind) -> Result<()> {
        let Ok(rel_path) = path.strip_prefix(&self.root) else { return Ok(()) };
        let rel_path = rel_path.to_string_lossy().replace('\\', "/");
        let mut fingerprints = self.fingerprints.lock().await;

        match kind {
            ChangeKind::Removed => self.pipeline.remove_file(&rel_path, &mut fingerprints).await?,
            ChangeKind::Created | ChangeKind::Modified => {
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    GlimpseError::internal_with_source(format!("reading {rel_path}"), e.into())
                })?;
                let file = SourceFile { rel_path, bytes };
                self.pipeline.index_file(&file, &mut fingerprints, None).await?;
            }
        }

        self.processed_files += 1;
        self.last_activity = Some(Utc::now());
        Ok(())
    }
}

/// Indexes on every debounced file-system event, as soon as the write-finish
/// stability window clears (§4.9 "Realtime").
pub struct RealtimeStrategy {
    shared: StrategyShared,
    state: StrategyState,
    watcher_config: WatcherConfig,
    receiver: Option<tokio::sync::mpsc::Receiver<crate::watcher::DebouncedEvent>>,
}

impl RealtimeStrategy {
    pub fn new(pipeline: Arc<Pipeline>, root: PathBuf, fingerprints: Arc<Mutex<glimpse_domain::FingerprintMap>>) -> Self {
        Self {
            shared: StrategyShared { pipeline, root, fingerprints, processed_files: 0, last_activity: None },
            state: StrategyState::Created,
            watcher_config: WatcherConfig::default(),
            receiver: None,
        }
    }
}

#[async_trait]
impl Strategy for RealtimeStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Realtime
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state = StrategyState::Initialized;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        let watcher = DebouncedWatcher::new(self.shared.root.clone(), self.watcher_config.clone());
        self.receiver = Some(watcher.spawn());
        self.state = StrategyState::Active;
        info!("realtime strategy active on {:?}", self.shared.root);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.receiver = None;
        self.state = StrategyState::Stopped;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state == StrategyState::Active
    }

    async fn on_file_event(&mut self, path: PathBuf, kind: ChangeKind) -> Result<()> {
        if self.state != StrategyState::Active {
            return Ok(());
        }
        self.shared.handle(path, kind).await
    }

    async fn flush(&mut self) -> Result<()> {
        if self.state != StrategyState::Active {
            return Ok(());
        }
        if let Some(receiver) = self.receiver.as_mut() {
            while let Ok(event) = receiver.try_recv() {
                self.shared.handle(event.path, event.kind).await?;
            }
        }
        Ok(())
    }

    fn stats(&self) -> StrategyStats {
        StrategyStats {
            name: self.name(),
            is_active: self.is_active(),
            pending_files: 0,
            processed_files: self.shared.processed_files,
            last_activity: self.shared.last_activity,
        }
    }

    fn take_watch_events(&mut self) -> Option<tokio::sync::mpsc::Receiver<crate::watcher::DebouncedEvent>> {
        self.receiver.take()
    }
}

/// Buffers file events and only indexes them once the project has been idle
/// for `lazy_idle_threshold_ms` (§4.9 "Lazy").
pub struct LazyStrategy {
    shared: StrategyShared,
    state: StrategyState,
    idle_threshold: std::time::Duration,
    pending: Vec<(PathBuf, ChangeKind)>,
    last_event_at: Option<tokio::time::Instant>,
}

impl LazyStrategy {
    pub fn new(
        pipeline: Arc<Pipeline>,
        root: PathBuf,
        fingerprints: Arc<Mutex<glimpse_domain::FingerprintMap>>,
        idle_threshold_ms: u64,
    ) -> Self {
        Self {
            shared: StrategyShared { pipeline, root, fingerprints, processed_files: 0, last_activity: None },
            state: StrategyState::Created,
            idle_threshold: std::time::Duration::from_millis(idle_threshold_ms),
            pending: Vec::new(),
            last_event_at: None,
        }
    }

    fn idle_long_enough(&self) -> bool {
        self.last_event_at.map(|t| t.elapsed() >= self.idle_threshold).unwrap_or(false)
    }
}

#[async_trait]
impl Strategy for LazyStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Lazy
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state = StrategyState::Initialized;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        self.state = StrategyState::Active;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.state = StrategyState::Stopped;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state == StrategyState::Active
    }

    async fn on_file_event(&mut self, path: PathBuf, kind: ChangeKind) -> Result<()> {
        if self.state != StrategyState::Active {
            return Ok(());
        }
        self.pending.push((path, kind));
        self.last_event_at = Some(tokio::time::Instant::now());
        if self.idle_long_enough() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        for (path, kind) in self.pending.drain(..) {
            self.shared.handle(path, kind).await?;
        }
        Ok(())
    }

    fn stats(&self) -> StrategyStats {
        StrategyStats {
            name: self.name(),
            is_active: self.is_active(),
            pending_files: self.pending.len(),
            processed_files: self.shared.processed_files,
            last_activity: self.shared.last_activity,
        }
    }
}

/// Indexes only on explicit trigger (commit hook / manual `update`), never
/// watching the filesystem itself (§4.9 "Git").
pub struct GitStrategy {
    shared: StrategyShared,
    state: StrategyState,
}

impl GitStrategy {
    pub fn new(pipeline: Arc<Pipeline>, root: PathBuf, fingerprints: Arc<Mutex<glimpse_domain::FingerprintMap>>) -> Self {
        Self { shared: StrategyShared { pipeline, root, fingerprints, processed_files: 0, last_activity: None }, state: StrategyState::Created }
    }
}

#[async_trait]
impl Strategy for GitStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Git
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state = StrategyState::Initialized;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        self.state = StrategyState::Active;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.state = StrategyState::Stopped;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state == StrategyState::Active
    }

    async fn on_file_event(&mut self, path: PathBuf, kind: ChangeKind) -> Result<()> {
        if self.state != StrategyState::Active {
            return Ok(());
        }
        self.shared.handle(path, kind).await
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> StrategyStats {
        StrategyStats {
            name: self.name(),
            is_active: self.is_active(),
            pending_files: 0,
            processed_files: self.shared.processed_files,
            last_activity: self.shared.last_activity,
        }
    }
}

/// Switches strategies at runtime: flush, then stop, then initialize and
/// start the replacement, idempotently (§4.9 "Orchestrator").
pub struct Orchestrator {
    current: Box<dyn Strategy>,
}

impl Orchestrator {
    pub fn new(initial: Box<dyn Strategy>) -> Self {
        Self { current: initial }
    }

    pub fn active_name(&self) -> StrategyName {
        self.current.name()
    }

    /// No-op when `next` is already the active strategy's kind.
    pub async fn set_strategy(&mut self, mut next: Box<dyn Strategy>) -> Result<()> {
        if next.name() == self.current.name() {
            return Ok(());
        }
        self.current.flush().await?;
        self.current.stop().await?;
        next.initialize().await?;
        next.start().await?;
        warn!("switched strategy from {:?} to {:?}", self.current.name(), next.name());
        self.current = next;
        Ok(())
    }

    pub async fn on_file_event(&mut self, path: PathBuf, kind: ChangeKind) -> Result<()> {
        self.current.on_file_event(path, kind).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.current.flush().await
    }

    pub fn stats(&self) -> StrategyStats {
        self.current.stats()
    }

    pub fn take_watch_events(&mut self) -> Option<tokio::sync::mpsc::Receiver<crate::watcher::DebouncedEvent>> {
        self.current.take_watch_events()
    }
}
