//! Strongly-typed configuration (§6, §9 "duck-typed configuration blobs").

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::chunk::ContentClass;
use crate::error::{GlimpseError, Result};
use crate::policy::PolicyConfig;
use crate::strategy::StrategyName;

/// Per-content-class chunking parameters (§4.2 "profiles"). Code chunks are
/// small with modest overlap; docs chunks are ~4x larger with ~4x overlap.
/// The embedding dimension is fixed per class and is never mixed.
#[derive(Debug, Clone, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct ChunkingProfile {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

impl ChunkingProfile {
    pub fn code() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            separators: default_separators(),
        }
    }

    pub fn docs() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 400,
            separators: default_separators(),
        }
    }

    pub fn for_class(class: ContentClass) -> Self {
        match class {
            ContentClass::Code => Self::code(),
            ContentClass::Docs => Self::docs(),
        }
    }
}

fn default_separators() -> Vec<String> {
    vec!["\n\n".to_string(), "\n".to_string(), ". ".to_string(), " ".to_string(), String::new()]
}

#[derive(Debug, Clone, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct ProcessingConfig {
    /// Batch size for a full/incremental pass over code files (§4.8).
    pub code_batch_size: usize,
    /// Smaller batch used under memory pressure ("streaming" mode).
    pub streaming_batch_size: usize,
    pub max_concurrent_files: usize,
    /// Minimum saved-embedding ratio to prefer incremental reindex (§4.7).
    pub incremental_min_saved_ratio: f32,
    /// Minimum old-chunk count to consider incremental reindex at all.
    pub incremental_min_chunk_count: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            code_batch_size: 50,
            streaming_batch_size: 3,
            max_concurrent_files: 8,
            incremental_min_saved_ratio: 0.25,
            incremental_min_chunk_count: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct StrategyConfig {
    pub default_strategy: StrategyName,
    pub lazy_idle_threshold_ms: u64,
    /// `checkDrift` scheduler period; 24h by default (§4.10).
    pub drift_check_interval_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            default_strategy: StrategyName::Realtime,
            lazy_idle_threshold_ms: 5_000,
            drift_check_interval_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceOverride {
    Auto,
    Cpu,
    GpuNative,
    GpuBrowser,
}

impl Default for DeviceOverride {
    fn default() -> Self {
        Self::Auto
    }
}

/// The root configuration object, assembled from a TOML file plus
/// environment overrides (§2.4 in SPEC_FULL.md).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct GlimpseConfig {
    pub policy: PolicyConfig,
    pub processing: ProcessingConfig,
    pub strategy: StrategyConfig,
    pub device: DeviceOverride,
    /// Emit `[code-comment] <path>` doc-like chunks from code files into the
    /// docs store (§4.8).
    pub extract_comments: bool,
}

/// Parse a human-readable size (`"10MB"`, `"512KB"`, `"100"`) into bytes.
/// Used at config-load time so the rest of the engine only ever sees raw
/// byte counts (§9 "duck-typed configuration blobs" note).
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let (number_part, multiplier) = if let Some(n) = trimmed.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = trimmed.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = trimmed.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = trimmed.strip_suffix('B') {
        (n, 1)
    } else {
        (trimmed, 1)
    };

    number_part
        .trim()
        .parse::<f64>()
        .map(|value| (value * multiplier as f64) as u64)
        .map_err(|_| GlimpseError::configuration("maxFileSize", format!("not a size: `{input}`")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn docs_profile_is_four_times_code_profile() {
        let code = ChunkingProfile::code();
        let docs = ChunkingProfile::docs();
        assert_eq!(docs.chunk_size, code.chunk_size * 4);
        assert_eq!(docs.chunk_overlap, code.chunk_overlap * 4);
    }

    #[test]
    fn parse_size_handles_suffixes() {
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("512KB").unwrap(), 512 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("100").unwrap(), 100);
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("not-a-size").is_err());
    }
}
