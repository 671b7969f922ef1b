//! Fingerprint map and drift report (§4.6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Authoritative record of what's currently indexed: relative path to the
/// file-level content hash used to populate the index.
pub type FingerprintMap = BTreeMap<String, String>;

/// Result of reconciling the filesystem against a `FingerprintMap`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
}

impl DriftReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }
}

/// Compare a freshly scanned `(path, content_hash)` set against the
/// recorded fingerprint map.
pub fn diff_fingerprints<'a>(
    recorded: &FingerprintMap,
    scanned: impl Iterator<Item = (&'a str, &'a str)>,
) -> DriftReport {
    let mut report = DriftReport::default();
    let mut seen = std::collections::BTreeSet::new();

    for (path, hash) in scanned {
        seen.insert(path.to_string());
        match recorded.get(path) {
            None => report.added.push(path.to_string()),
            Some(old_hash) if old_hash != hash => report.modified.push(path.to_string()),
            Some(_) => {}
        }
    }

    for path in recorded.keys() {
        if !seen.contains(path) {
            report.removed.push(path.clone());
        }
    }

    report.added.sort();
    report.modified.sort();
    report.removed.sort();
    report
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn detects_added_modified_and_removed() {
        let mut recorded = FingerprintMap::new();
        recorded.insert("a.rs".to_string(), "h1".to_string());
        recorded.insert("b.rs".to_string(), "h2".to_string());
        recorded.insert("c.rs".to_string(), "h3".to_string());

        let scanned = vec![("a.rs", "h1"), ("b.rs", "h2-changed"), ("d.rs", "h4")];

        let report = diff_fingerprints(&recorded, scanned.into_iter());

        assert_eq!(report.added, vec!["d.rs".to_string()]);
        assert_eq!(report.modified, vec!["b.rs".to_string()]);
        assert_eq!(report.removed, vec!["c.rs".to_string()]);
    }

    #[test]
    fn identical_scan_yields_empty_report() {
        let mut recorded = FingerprintMap::new();
        recorded.insert("a.rs".to_string(), "h1".to_string());
        let report = diff_fingerprints(&recorded, vec![("a.rs", "h1")].into_iter());
        assert!(report.is_empty());
    }
}
