//! Types describing file-eligibility decisions (see the policy module in
//! `glimpse-indexer` for the rule engine itself).

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Why a policy decision landed the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyCategory {
    Hardcoded,
    UserExclude,
    Gitignore,
    Binary,
    Size,
    IncludeMismatch,
}

/// The result of evaluating a path against the indexing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub should_index: bool,
    pub reason: Option<String>,
    pub category: Option<PolicyCategory>,
}

impl PolicyDecision {
    pub fn accept() -> Self {
        Self { should_index: true, reason: None, category: None }
    }

    pub fn reject(category: PolicyCategory, reason: impl Into<String>) -> Self {
        Self { should_index: false, reason: Some(reason.into()), category: Some(category) }
    }
}

/// User-facing configuration for the indexing policy (§6 "Configuration"
/// table: `include`/`exclude`/`respectGitignore`/`maxFileSize`).
#[derive(Debug, Clone, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct PolicyConfig {
    /// User globs for step 2 (deny-equivalent semantics, overridable only by
    /// removal from config).
    pub exclude: Vec<String>,
    /// User globs for step 6; a non-default value requires a match.
    pub include: Vec<String>,
    pub respect_gitignore: bool,
    /// Maximum recursion depth for nested `.gitignore` discovery.
    pub gitignore_max_depth: usize,
    /// Bytes; files strictly larger are rejected.
    pub max_file_size_bytes: u64,
    /// Bytes read from the head of a file when classifying unknown
    /// extensions as binary vs. text.
    pub binary_sniff_bytes: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            include: Vec::new(),
            respect_gitignore: true,
            gitignore_max_depth: 64,
            max_file_size_bytes: 1024 * 1024,
            binary_sniff_bytes: 8192,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn accept_has_no_category() {
        let decision = PolicyDecision::accept();
        assert!(decision.should_index);
        assert_eq!(decision.category, None);
    }

    #[test]
    fn reject_carries_category_and_reason() {
        let decision = PolicyDecision::reject(PolicyCategory::Binary, "null byte in head");
        assert!(!decision.should_index);
        assert_eq!(decision.category, Some(PolicyCategory::Binary));
    }
}
