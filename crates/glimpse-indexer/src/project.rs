//! Project root detection (§6): search upward from a starting directory
//! for a recognized project marker.

use std::path::{Path, PathBuf};

use glimpse_domain::{GlimpseError, Result};

/// Checked in this order at every ancestor directory; the first hit wins.
const MARKERS: &[&str] = &[".git", "package.json", "pyproject.toml", "Cargo.toml", "go.mod"];

/// Walks upward from `start` looking for a project marker, failing with
/// `ProjectNotDetected` once the filesystem root is reached without a hit.
pub fn detect_project_root(start: &Path) -> Result<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or_else(|| start.to_path_buf())
    } else {
        start.to_path_buf()
    };

    loop {
        for marker in MARKERS {
            if dir.join(marker).exists() {
                return Ok(dir);
            }
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => return Err(GlimpseError::project_not_detected(start.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn finds_cargo_toml_at_an_ancestor() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("Cargo.toml"), "[package]").unwrap();
        let nested = root.path().join("src/inner");
        std::fs::create_dir_all(&nested).unwrap();

        let found = detect_project_root(&nested).unwrap();
        assert_eq!(found, root.path());
    }

    #[test]
    fn marker_precedence_prefers_git_over_cargo_toml_at_same_level() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join(".git")).unwrap();
        std::fs::write(root.path().join("Cargo.toml"), "[package]").unwrap();

        let found = detect_project_root(root.path()).unwrap();
        assert_eq!(found, root.path());
    }

    #[test]
    fn prefers_nearest_ancestor_over_a_further_one() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("Cargo.toml"), "[package]").unwrap();
        let nested = root.path().join("crates/inner");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Cargo.toml"), "[package]").unwrap();

        let found = detect_project_root(&nested).unwrap();
        assert_eq!(found, nested);
    }
}
