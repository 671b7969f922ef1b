//! On-disk persisted state (§6): the fingerprint map and Merkle snapshot
//! live as JSON files under `<project root>/.glimpse/`.

use std::path::{Path, PathBuf};

use glimpse_domain::{FingerprintMap, GlimpseError, MerkleSnapshot, Result};

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(".glimpse")
}

fn fingerprints_path(root: &Path) -> PathBuf {
    state_dir(root).join("fingerprints.json")
}

fn merkle_path(root: &Path) -> PathBuf {
    state_dir(root).join("merkle-tree.json")
}

pub async fn load_fingerprints(root: &Path) -> Result<FingerprintMap> {
    let path = fingerprints_path(root);
    match tokio::fs::read(&path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| GlimpseError::index_corrupt(format!("fingerprints.json: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FingerprintMap::new()),
        Err(e) => Err(GlimpseError::permission_denied_with_source(path.display().to_string(), e)),
    }
}

pub async fn save_fingerprints(root: &Path, map: &FingerprintMap) -> Result<()> {
    tokio::fs::create_dir_all(state_dir(root))
        .await
        .map_err(|e| GlimpseError::permission_denied_with_source(state_dir(root).display().to_string(), e))?;
    let bytes = serde_json::to_vec_pretty(map)
        .map_err(|e| GlimpseError::internal_with_source("serializing fingerprints", e.into()))?;
    tokio::fs::write(fingerprints_path(root), bytes)
        .await
        .map_err(|e| GlimpseError::permission_denied_with_source(fingerprints_path(root).display().to_string(), e))
}

pub async fn load_merkle_snapshot(root: &Path) -> Result<MerkleSnapshot> {
    let path = merkle_path(root);
    match tokio::fs::read(&path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| GlimpseError::index_corrupt(format!("merkle-tree.json: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MerkleSnapshot::empty()),
        Err(e) => Err(GlimpseError::permission_denied_with_source(path.display().to_string(), e)),
    }
}

pub async fn save_merkle_snapshot(root: &Path, snapshot: &MerkleSnapshot) -> Result<()> {
    tokio::fs::create_dir_all(state_dir(root))
        .await
        .map_err(|e| GlimpseError::permission_denied_with_source(state_dir(root).display().to_string(), e))?;
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| GlimpseError::internal_with_source("serializing merkle snapshot", e.into()))?;
    tokio::fs::write(merkle_path(root), bytes)
        .await
        .map_err(|e| GlimpseError::permission_denied_with_source(merkle_path(root).display().to_string(), e))
}

/// Removes all persisted state, used by `rebuild` (§6 "rebuild" command).
pub async fn clear(root: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(state_dir(root)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GlimpseError::permission_denied_with_source(state_dir(root).display().to_string(), e)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn missing_state_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let fingerprints = load_fingerprints(dir.path()).await.unwrap();
        assert!(fingerprints.is_empty());
        let snapshot = load_merkle_snapshot(dir.path()).await.unwrap();
        assert!(snapshot.files.is_empty());
    }

    #[tokio::test]
    async fn fingerprints_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let mut map = FingerprintMap::new();
        map.insert("a.rs".to_string(), "hash".to_string());
        save_fingerprints(dir.path(), &map).await.unwrap();

        let loaded = load_fingerprints(dir.path()).await.unwrap();
        assert_eq!(loaded, map);
    }

    #[tokio::test]
    async fn clear_removes_the_state_directory() {
        let dir = TempDir::new().unwrap();
        save_fingerprints(dir.path(), &FingerprintMap::new()).await.unwrap();
        assert!(state_dir(dir.path()).exists());
        clear(dir.path()).await.unwrap();
        assert!(!state_dir(dir.path()).exists());
    }
}
