//! Indexing Policy (§4.1): decides which files are eligible, in strict
//! precedence order. Every path is hardened against Unicode spoofing before
//! any glob runs against it.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use glimpse_domain::{PolicyCategory, PolicyConfig, PolicyDecision};
use unicode_normalization::UnicodeNormalization;

/// Globs that are always denied regardless of user configuration: VCS
/// internals, dependency directories, build output, secrets, lockfiles,
/// IDE config, test caches.
const HARD_DENY_GLOBS: &[&str] = &[
    "**/.git/**",
    "**/.svn/**",
    "**/.hg/**",
    "**/node_modules/**",
    "**/target/**",
    "**/dist/**",
    "**/build/**",
    "**/.venv/**",
    "**/venv/**",
    "**/__pycache__/**",
    "**/.env",
    "**/.env.*",
    "**/*.pem",
    "**/*.key",
    "**/*.lock",
    "**/.idea/**",
    "**/.vscode/**",
    "**/.pytest_cache/**",
    "**/.mypy_cache/**",
];

/// Extensions known to be text; short-circuits binary sniffing (§4.1 step 4).
const TEXT_EXTENSIONS: &[&str] = &[
    "rs", "py", "ts", "tsx", "js", "jsx", "go", "java", "cs", "c", "h", "cpp", "hpp", "cc", "md",
    "txt", "json", "yaml", "yml", "toml", "xml", "html", "css", "scss", "sh", "rb", "php",
];

/// Extensions known to be binary; rejected without reading the file.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "zip", "tar", "gz", "7z", "exe",
    "dll", "so", "dylib", "bin", "wasm", "woff", "woff2", "ttf", "class", "jar", "o", "a",
];

/// Strips characters that can be used to visually spoof a path while
/// bypassing glob matching: zero-width spaces/joiners/BOM, and bidi
/// override control characters (§4.1 "Security properties").
fn strip_hostile_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(*c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{202A}'..='\u{202E}')
        })
        .collect()
}

/// Normalizes a path the way every policy check must see it: NFC-normalized,
/// hostile-character-stripped, forward slashes.
pub fn harden_path(rel_path: &str) -> String {
    let nfc: String = rel_path.nfc().collect();
    strip_hostile_chars(&nfc).replace('\\', "/")
}

#[derive(Clone)]
pub struct Policy {
    config: PolicyConfig,
    hard_deny: GlobSet,
    user_exclude: GlobSet,
    user_include: GlobSet,
    has_include: bool,
    case_insensitive: bool,
}

impl Policy {
    pub fn new(config: PolicyConfig, case_insensitive_fs: bool) -> Self {
        let hard_deny = build_globset(HARD_DENY_GLOBS.iter().map(|s| s.to_string()), case_insensitive_fs);
        let user_exclude = build_globset(config.exclude.iter().cloned(), case_insensitive_fs);
        let has_include = !config.include.is_empty();
        let user_include = build_globset(config.include.iter().cloned(), case_insensitive_fs);
        Self { config, hard_deny, user_exclude, user_include, has_include, case_insensitive: case_insensitive_fs }
    }

    pub fn respect_gitignore(&self) -> bool {
        self.config.respect_gitignore
    }

    pub fn gitignore_max_depth(&self) -> usize {
        self.config.gitignore_max_depth
    }

    /// Synchronous, pure hard-deny check, usable on the filewatcher's hot
    /// path without touching the filesystem (§4.1, invariant 1).
    pub fn is_hard_denied(&self, rel_path: &str) -> bool {
        let hardened = harden_path(rel_path);
        let candidate = if self.case_insensitive { hardened.to_lowercase() } else { hardened };
        self.hard_deny.is_match(&candidate)
    }

    /// Full decision, requiring filesystem access for gitignore/binary/size
    /// checks. `read_head` supplies the first `binary_sniff_bytes` of the
    /// file; callers on the scan path read lazily and only when needed.
    pub fn should_index(
        &self,
        rel_path: &str,
        size_bytes: Option<u64>,
        gitignored: bool,
        read_head: impl FnOnce() -> std::io::Result<Vec<u8>>,
    ) -> PolicyDecision {
        let hardened = harden_path(rel_path);
        let candidate = if self.case_insensitive { hardened.to_lowercase() } else { hardened.clone() };

        if self.hard_deny.is_match(&candidate) {
            return PolicyDecision::reject(PolicyCategory::Hardcoded, format!("hard-denied: {rel_path}"));
        }
        if self.user_exclude.is_match(&candidate) {
            return PolicyDecision::reject(PolicyCategory::UserExclude, format!("user-excluded: {rel_path}"));
        }
        if self.config.respect_gitignore && gitignored {
            return PolicyDecision::reject(PolicyCategory::Gitignore, format!("gitignored: {rel_path}"));
        }

        if self.is_binary(&hardened, read_head) {
            return PolicyDecision::reject(PolicyCategory::Binary, format!("binary: {rel_path}"));
        }

        if let Some(size) = size_bytes {
            if size > self.config.max_file_size_bytes {
                return PolicyDecision::reject(
                    PolicyCategory::Size,
                    format!("{size} bytes exceeds {} byte limit", self.config.max_file_size_bytes),
                );
            }
        }

        if self.has_include && !self.user_include.is_match(&candidate) {
            return PolicyDecision::reject(PolicyCategory::IncludeMismatch, format!("not included: {rel_path}"));
        }

        PolicyDecision::accept()
    }

    fn is_binary(&self, hardened_path: &str, read_head: impl FnOnce() -> std::io::Result<Vec<u8>>) -> bool {
        let ext = Path::new(hardened_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return false;
        }
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }

        match read_head() {
            Ok(head) => head.iter().take(self.config.binary_sniff_bytes).any(|&b| b == 0),
            Err(_) => false,
        }
    }
}

fn build_globset(patterns: impl Iterator<Item = String>, case_insensitive: bool) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = if case_insensitive { pattern.to_lowercase() } else { pattern };
        if let Ok(glob) = Glob::new(&pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn policy() -> Policy {
        Policy::new(PolicyConfig::default(), false)
    }

    #[test]
    fn hard_deny_matches_dotenv_and_node_modules() {
        let policy = policy();
        assert!(policy.is_hard_denied(".env"));
        assert!(policy.is_hard_denied("node_modules/x.js"));
        assert!(!policy.is_hard_denied("src/a.ts"));
    }

    #[test]
    fn hard_deny_survives_zero_width_and_bidi_insertion() {
        let policy = policy();
        let poisoned = format!(".e\u{200B}nv");
        assert!(policy.is_hard_denied(&poisoned));
    }

    #[test]
    fn hard_deny_is_case_insensitive_on_case_insensitive_filesystems() {
        let policy = Policy::new(PolicyConfig::default(), true);
        assert!(policy.is_hard_denied("NODE_MODULES/x.js"));
    }

    #[test]
    fn unknown_extension_with_null_byte_is_rejected_as_binary() {
        let policy = policy();
        let decision = policy.should_index("weird.dat", Some(10), false, || Ok(vec![0u8, 1, 2]));
        assert!(!decision.should_index);
        assert_eq!(decision.category, Some(PolicyCategory::Binary));
    }

    #[test]
    fn known_text_extension_skips_sniffing_even_with_null_bytes() {
        let policy = policy();
        let decision = policy.should_index("a.rs", Some(10), false, || Ok(vec![0u8]));
        assert!(decision.should_index);
    }

    #[test]
    fn size_over_limit_is_rejected() {
        let mut config = PolicyConfig::default();
        config.max_file_size_bytes = 100;
        let policy = Policy::new(config, false);
        let decision = policy.should_index("a.rs", Some(200), false, || Ok(Vec::new()));
        assert_eq!(decision.category, Some(PolicyCategory::Size));
    }

    #[test]
    fn include_mismatch_rejects_when_include_list_nonempty() {
        let mut config = PolicyConfig::default();
        config.include = vec!["src/**".to_string()];
        let policy = Policy::new(config, false);
        let decision = policy.should_index("docs/readme.md", Some(10), false, || Ok(Vec::new()));
        assert_eq!(decision.category, Some(PolicyCategory::IncludeMismatch));
        let decision = policy.should_index("src/a.rs", Some(10), false, || Ok(Vec::new()));
        assert!(decision.should_index);
    }
}
