//! Project scanning (§4.6): walks the tree with the Policy applied and
//! hashes eligible files, guarded against pathological inputs per the DoS
//! guards named in §4.6 ("glob has total-result cap, maximum recursion
//! depth, and an abortable timeout").

use std::path::Path;
use std::time::{Duration, Instant};

use glimpse_domain::{GlimpseError, Result, content_hash};
use ignore::WalkBuilder;

use crate::policy::Policy;

pub struct ScanLimits {
    pub max_results: usize,
    pub max_depth: usize,
    pub timeout: Duration,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self { max_results: 200_000, max_depth: 256, timeout: Duration::from_secs(120) }
    }
}

pub struct ScannedFile {
    pub rel_path: String,
    pub content_hash: String,
    pub size: u64,
}

/// Walks `root`, applying `policy` and `limits`. Exceeding a cap is a fatal
/// `ResourceLimit` error, not silent truncation (§4.6).
pub fn scan_project(root: &Path, policy: &Policy, limits: &ScanLimits) -> Result<Vec<ScannedFile>> {
    let started = Instant::now();
    let mut out = Vec::new();

    let walker = WalkBuilder::new(root)
        .max_depth(Some(limits.max_depth.min(policy.gitignore_max_depth())))
        .follow_links(false)
        .hidden(false)
        .git_ignore(policy.respect_gitignore())
        .build();

    for entry in walker {
        if started.elapsed() > limits.timeout {
            return Err(GlimpseError::resource_limit("scan timeout", format!("{:?}", started.elapsed())));
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if entry.file_type().map(|t| !t.is_file()).unwrap_or(true) {
            continue;
        }

        let rel_path = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        if policy.is_hard_denied(&rel_path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        let size = metadata.len();

        let decision = policy.should_index(&rel_path, Some(size), false, || std::fs::read(entry.path()));
        if !decision.should_index {
            continue;
        }

        let Ok(bytes) = std::fs::read(entry.path()) else { continue };
        out.push(ScannedFile { rel_path, content_hash: content_hash(&bytes), size });

        if out.len() > limits.max_results {
            return Err(GlimpseError::resource_limit("scan result cap", out.len().to_string()));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use glimpse_domain::PolicyConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn scans_eligible_files_and_skips_hard_denied() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), b"fn a() {}").unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/x.js"), b"ignored").unwrap();
        std::fs::write(dir.path().join(".env"), b"SECRET=1").unwrap();

        let policy = Policy::new(PolicyConfig::default(), false);
        let files = scan_project(dir.path(), &policy, &ScanLimits::default()).unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.rel_path.clone()).collect();
        assert!(paths.contains(&"a.rs".to_string()));
        assert!(!paths.iter().any(|p| p.contains("node_modules")));
        assert!(!paths.contains(&".env".to_string()));
    }

    #[test]
    fn exceeding_result_cap_is_a_fatal_error() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            std::fs::write(dir.path().join(format!("f{i}.rs")), b"fn a() {}").unwrap();
        }
        let policy = Policy::new(PolicyConfig::default(), false);
        let limits = ScanLimits { max_results: 2, ..ScanLimits::default() };
        let err = scan_project(dir.path(), &policy, &limits).unwrap_err();
        assert_eq!(err.error_code(), "RESOURCE_LIMIT");
    }
}
