//! Configuration loading (§6, §9 "duck-typed configuration blobs"):
//! layers an optional `glimpse.toml` under environment overrides and
//! deserializes straight into `GlimpseConfig`. Sizes are parsed into raw
//! byte counts at load time so nothing downstream sees a size string.

use std::path::Path;

use config::{Config, Environment, File};
use glimpse_domain::{GlimpseConfig, GlimpseError, Result, parse_size};
use serde::Deserialize;

/// Mirrors `PolicyConfig` but accepts `maxFileSize` as a human string
/// (`"10MB"`) the way a user would actually write it in a config file.
#[derive(Debug, Deserialize)]
struct RawPolicyConfig {
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default = "default_true")]
    respect_gitignore: bool,
    #[serde(default = "default_gitignore_depth")]
    gitignore_max_depth: usize,
    #[serde(default = "default_max_file_size")]
    max_file_size: String,
    #[serde(default = "default_binary_sniff_bytes")]
    binary_sniff_bytes: usize,
}

fn default_true() -> bool {
    true
}
fn default_gitignore_depth() -> usize {
    64
}
fn default_max_file_size() -> String {
    "1MB".to_string()
}
fn default_binary_sniff_bytes() -> usize {
    8192
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    policy: Option<RawPolicyConfig>,
    #[serde(default)]
    extract_comments: bool,
}

/// Loads `GlimpseConfig` from `<root>/glimpse.toml` (if present) layered
/// under `GLIMPSE_*` environment variables, falling back to defaults for
/// anything unset.
pub fn load(root: &Path) -> Result<GlimpseConfig> {
    let config_path = root.join("glimpse.toml");

    let builder = Config::builder()
        .add_source(File::from(config_path.clone()).required(false))
        .add_source(Environment::with_prefix("GLIMPSE").separator("_"));

    let raw: RawConfig = builder
        .build()
        .map_err(|e| GlimpseError::configuration("glimpse.toml", e.to_string()))?
        .try_deserialize()
        .map_err(|e| GlimpseError::configuration("glimpse.toml", e.to_string()))?;

    let mut config = GlimpseConfig::default();
    config.extract_comments = raw.extract_comments;

    if let Some(policy) = raw.policy {
        config.policy.exclude = policy.exclude;
        config.policy.include = policy.include;
        config.policy.respect_gitignore = policy.respect_gitignore;
        config.policy.gitignore_max_depth = policy.gitignore_max_depth;
        config.policy.max_file_size_bytes = parse_size(&policy.max_file_size)?;
        config.policy.binary_sniff_bytes = policy.binary_sniff_bytes;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load(dir.path()).unwrap();
        assert_eq!(config.policy.max_file_size_bytes, 1024 * 1024);
        assert!(config.policy.respect_gitignore);
    }

    #[test]
    fn config_file_overrides_policy_size_and_excludes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("glimpse.toml"),
            "extract_comments = true\n\n[policy]\nmax_file_size = \"5MB\"\nexclude = [\"**/fixtures/**\"]\n",
        )
        .unwrap();

        let config = load(dir.path()).unwrap();
        assert!(config.extract_comments);
        assert_eq!(config.policy.max_file_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.policy.exclude, vec!["**/fixtures/**".to_string()]);
    }
}
