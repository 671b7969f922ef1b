//! Glimpse Indexer: local-first semantic code search engine (§1).

pub mod chunking;
pub mod config;
pub mod device_select;
pub mod extraction;
pub mod incremental;
pub mod integrity;
pub mod logging;
pub mod merkle_builder;
pub mod pipeline;
pub mod policy;
pub mod project;
pub mod scan;
pub mod state;
pub mod strategy;
pub mod watcher;

pub use chunking::DispatchChunker;
pub use integrity::{IntegrityEngine, Scheduler};
pub use pipeline::{IndexStats, Pipeline, SourceFile};
pub use policy::Policy;
pub use project::detect_project_root;
pub use scan::{ScanLimits, ScannedFile, scan_project};
pub use strategy::{GitStrategy, LazyStrategy, Orchestrator, RealtimeStrategy, Strategy};
pub use watcher::{ChangeKind, DebouncedEvent, DebouncedWatcher, WatcherConfig};
