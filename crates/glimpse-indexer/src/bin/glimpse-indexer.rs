//! Glimpse Indexer CLI: status, index, update, rebuild, drift, strategy, watch.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::stream::{self, StreamExt};
use glimpse_domain::{DriftReport, FingerprintMap, GlimpseError, StrategyName};
use glimpse_indexer::{
    DispatchChunker, GitStrategy, IntegrityEngine, LazyStrategy, Orchestrator, Pipeline, Policy, RealtimeStrategy, SourceFile, Strategy,
    scan_project,
};
use glimpse_services::{HashEmbedder, InMemoryChunkStore};
use tokio::sync::Mutex;
use tracing::{error, info};

mod indexer;

use indexer::signals::setup_shutdown_signal;
use indexer::{Args, Commands, StrategyArg};

#[tokio::main]
async fn main() {
    if let Err(err) = glimpse_indexer::logging::init_default_logging() {
        eprintln!("logging init failed: {err}");
    }

    let args = Args::parse();
    match run(args).await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err}");
            std::process::exit(err.exit_code());
        }
    }
}

async fn run(args: Args) -> Result<(), GlimpseError> {
    let start = PathBuf::from(&args.path);
    let root = glimpse_indexer::detect_project_root(&start)?;
    info!("project root: {:?}", root);

    let config = glimpse_indexer::config::load(&root)?;
    let policy = Policy::new(config.policy.clone(), cfg!(any(target_os = "windows", target_os = "macos")));

    let pipeline = Arc::new(Pipeline {
        chunker: Arc::new(DispatchChunker::new()),
        code_store: Arc::new(Mutex::new(InMemoryChunkStore::new(glimpse_domain::ContentClass::Code.embedding_dimension()))),
        code_embedder: Arc::new(HashEmbedder::code()),
        docs_store: Arc::new(Mutex::new(InMemoryChunkStore::new(glimpse_domain::ContentClass::Docs.embedding_dimension()))),
        docs_embedder: Arc::new(HashEmbedder::docs()),
        config: config.clone(),
    });
    pipeline.code_store.lock().await.open().await?;
    pipeline.docs_store.lock().await.open().await?;

    match args.command {
        Commands::Status => cmd_status(&root).await,
        Commands::Index => cmd_full_index(&root, &policy, pipeline).await,
        Commands::Update => cmd_update(&root, &policy, pipeline).await,
        Commands::Rebuild => {
            glimpse_indexer::state::clear(&root).await?;
            cmd_full_index(&root, &policy, pipeline).await
        }
        Commands::Drift => cmd_drift(&root, &policy, pipeline).await,
        Commands::Strategy { name } => {
            info!("requested strategy: {}", StrategyName::from(name).as_str());
            info!("strategy switching takes effect on the next `watch` run; see Orchestrator::set_strategy");
            Ok(())
        }
        Commands::Watch { strategy } => cmd_watch(&root, pipeline, strategy, &config).await,
    }
}

async fn cmd_status(root: &std::path::Path) -> Result<(), GlimpseError> {
    let fingerprints = glimpse_indexer::state::load_fingerprints(root).await?;
    println!("root: {:?}", root);
    println!("indexed files: {}", fingerprints.len());
    Ok(())
}

/// Indexes every scanned file, batched at `code_batch_size` with up to
/// `max_concurrent_files` files in flight per batch (§4.8).
async fn cmd_full_index(root: &std::path::Path, policy: &Policy, pipeline: Arc<Pipeline>) -> Result<(), GlimpseError> {
    let files = scan_project(root, policy, &glimpse_indexer::ScanLimits::default())?;
    let fingerprints = Arc::new(Mutex::new(FingerprintMap::new()));
    let batch_size = pipeline.config.processing.code_batch_size.max(1);
    let max_concurrent = pipeline.config.processing.max_concurrent_files.max(1);

    for batch in files.chunks(batch_size) {
        stream::iter(batch.iter())
            .map(|scanned| {
                let pipeline = pipeline.clone();
                let fingerprints = fingerprints.clone();
                let full_path = root.join(&scanned.rel_path);
                let rel_path = scanned.rel_path.clone();
                async move {
                    let bytes = tokio::fs::read(&full_path)
                        .await
                        .map_err(|e| GlimpseError::permission_denied_with_source(rel_path.clone(), e))?;
                    let file = SourceFile { rel_path, bytes };
                    let mut fingerprints = fingerprints.lock().await;
                    pipeline.index_file(&file, &mut fingerprints, None).await
                }
            })
            .buffer_unordered(max_concurrent)
            .collect::<Vec<Result<_, GlimpseError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
    }

    glimpse_indexer::state::save_fingerprints(root, &*fingerprints.lock().await).await?;
    info!("indexed {} files", files.len());
    Ok(())
}

async fn cmd_update(root: &std::path::Path, policy: &Policy, pipeline: Arc<Pipeline>) -> Result<(), GlimpseError> {
    let fingerprints = Arc::new(Mutex::new(glimpse_indexer::state::load_fingerprints(root).await?));
    let engine = IntegrityEngine::new(root.to_path_buf(), policy.clone(), pipeline, fingerprints.clone());
    let drift = engine.reconcile(None).await?;
    glimpse_indexer::state::save_fingerprints(root, &*fingerprints.lock().await).await?;
    report_drift(&drift);
    Ok(())
}

async fn cmd_drift(root: &std::path::Path, policy: &Policy, pipeline: Arc<Pipeline>) -> Result<(), GlimpseError> {
    let fingerprints = Arc::new(Mutex::new(glimpse_indexer::state::load_fingerprints(root).await?));
    let engine = IntegrityEngine::new(root.to_path_buf(), policy.clone(), pipeline, fingerprints);
    let drift = engine.check_drift().await?;
    report_drift(&drift);
    Ok(())
}

/// Runs as a long-lived process under `strategy`, pumping debounced
/// filesystem events through `Orchestrator::on_file_event` until shutdown
/// (§4.9). Starts on `GitStrategy` (inert) and immediately hands off to the
/// requested strategy via `set_strategy`, the same switch a live `strategy`
/// subcommand would trigger against a running process.
async fn cmd_watch(
    root: &std::path::Path,
    pipeline: Arc<Pipeline>,
    strategy: StrategyArg,
    config: &glimpse_domain::GlimpseConfig,
) -> Result<(), GlimpseError> {
    let fingerprints = Arc::new(Mutex::new(glimpse_indexer::state::load_fingerprints(root).await?));

    let mut idle = GitStrategy::new(pipeline.clone(), root.to_path_buf(), fingerprints.clone());
    idle.initialize().await?;
    idle.start().await?;
    let mut orchestrator = Orchestrator::new(Box::new(idle));

    let active: Box<dyn Strategy> = match strategy {
        StrategyArg::Realtime => Box::new(RealtimeStrategy::new(pipeline.clone(), root.to_path_buf(), fingerprints.clone())),
        StrategyArg::Lazy => {
            Box::new(LazyStrategy::new(pipeline.clone(), root.to_path_buf(), fingerprints.clone(), config.strategy.lazy_idle_threshold_ms))
        }
        StrategyArg::Git => Box::new(GitStrategy::new(pipeline.clone(), root.to_path_buf(), fingerprints.clone())),
    };
    orchestrator.set_strategy(active).await?;
    info!("watching {:?} under the {:?} strategy", root, orchestrator.active_name());

    let mut watch_events = orchestrator.take_watch_events();
    let mut shutdown = Box::pin(setup_shutdown_signal());

    loop {
        tokio::select! {
            event = recv_watch_event(&mut watch_events) => {
                match event {
                    Some(event) => orchestrator.on_file_event(event.path, event.kind).await?,
                    None => break,
                }
            }
            _ = &mut shutdown => {
                info!("shutdown requested, flushing strategy");
                break;
            }
        }
    }

    orchestrator.flush().await?;
    glimpse_indexer::state::save_fingerprints(root, &*fingerprints.lock().await).await?;
    Ok(())
}

/// Awaits the next event from a strategy's watch channel, or never resolves
/// if the active strategy doesn't watch the filesystem itself (lazy/git).
async fn recv_watch_event(
    receiver: &mut Option<tokio::sync::mpsc::Receiver<glimpse_indexer::DebouncedEvent>>,
) -> Option<glimpse_indexer::DebouncedEvent> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

fn report_drift(drift: &DriftReport) {
    println!("added: {}, modified: {}, removed: {}", drift.added.len(), drift.modified.len(), drift.removed.len());
}
