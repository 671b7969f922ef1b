//! Pure types and trait contracts shared by the indexing engine. No I/O
//! lives here; concrete `ChunkStore`/`Embedder`/`Chunker` implementations
//! live in `glimpse_services`, and the engine itself lives in
//! `glimpse-indexer`.

pub mod chunk;
pub mod config;
pub mod device;
pub mod embedding;
pub mod error;
pub mod fingerprint;
pub mod merkle;
pub mod policy;
pub mod progress;
pub mod strategy;
pub mod summary;
pub mod traits;

pub use chunk::{Chunk, ContentClass, chunk_hash, content_hash};
pub use config::{ChunkingProfile, DeviceOverride, GlimpseConfig, ProcessingConfig, StrategyConfig,
                  parse_size};
pub use device::{Device, DeviceInfo, HostPlatform, Platform, PollingHints};
pub use embedding::{generate_hash_embedding, is_valid_vector, normalize_vector};
pub use error::{GlimpseError, Result};
pub use fingerprint::{DriftReport, FingerprintMap, diff_fingerprints};
pub use merkle::{ChunkDiff, ChunkNode, FileNode, MerkleSnapshot, ProjectDiff, project_root_hash};
pub use policy::{PolicyCategory, PolicyConfig, PolicyDecision};
pub use progress::{ProgressEvent, ProgressSink};
pub use strategy::{StrategyName, StrategyState, StrategyStats};
pub use summary::{ComplexitySummary, ExportInfo, FileSummary, FunctionInfo, ImportInfo,
                   LineCounts, TypeInfo, TypeKind, Visibility};
pub use traits::{ChunkRecord, ChunkStore, Chunker, EmbedBatchResult, Embedder, StoredChunk};
