//! Error taxonomy shared across the workspace.

use thiserror::Error;

/// Errors surfaced by the indexing engine.
///
/// Variants correspond to error *kinds*, not internal type names: each one
/// names a class of failure a caller needs to branch on (retry, surface to
/// the user, abort a batch), not the module that happened to detect it.
#[derive(Debug, Error)]
pub enum GlimpseError {
    #[error("configuration error in `{field}`: {message}")]
    Configuration { field: String, message: String },

    #[error("no project root detected searching upward from `{start}`")]
    ProjectNotDetected { start: String },

    #[error("permission denied accessing `{path}`")]
    PermissionDenied {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("file not found: `{path}`")]
    FileNotFound { path: String },

    #[error("index corrupt: {reason}")]
    IndexCorrupt { reason: String },

    #[error("embedder model initialization failed on all devices: {reason}")]
    ModelInitFailed { reason: String },

    #[error("resource limit exceeded: {limit} (observed {observed})")]
    ResourceLimit { limit: String, observed: String },

    #[error("busy: {operation} requested while indexing is active")]
    Busy { operation: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl GlimpseError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration { field: field.into(), message: message.into() }
    }

    pub fn project_not_detected(start: impl Into<String>) -> Self {
        Self::ProjectNotDetected { start: start.into() }
    }

    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into(), source: None }
    }

    pub fn permission_denied_with_source(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::PermissionDenied { path: path.into(), source: Some(source) }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn index_corrupt(reason: impl Into<String>) -> Self {
        Self::IndexCorrupt { reason: reason.into() }
    }

    pub fn model_init_failed(reason: impl Into<String>) -> Self {
        Self::ModelInitFailed { reason: reason.into() }
    }

    pub fn resource_limit(limit: impl Into<String>, observed: impl Into<String>) -> Self {
        Self::ResourceLimit { limit: limit.into(), observed: observed.into() }
    }

    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy { operation: operation.into() }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    pub fn internal_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Internal { message: message.into(), source: Some(source) }
    }

    /// Machine-readable code, stable across releases.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION",
            Self::ProjectNotDetected { .. } => "PROJECT_NOT_DETECTED",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::IndexCorrupt { .. } => "INDEX_CORRUPT",
            Self::ModelInitFailed { .. } => "MODEL_INIT_FAILED",
            Self::ResourceLimit { .. } => "RESOURCE_LIMIT",
            Self::Busy { .. } => "BUSY",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Internal { .. } => "INTERNAL",
        }
    }

    /// Whether retrying the same operation unchanged might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::PermissionDenied { .. })
    }

    /// Suggested process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 2,
            Self::ProjectNotDetected { .. } => 3,
            Self::IndexCorrupt { .. } => 4,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for GlimpseError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal { message: err.to_string(), source: Some(err) }
    }
}

pub type Result<T> = std::result::Result<T, GlimpseError>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(GlimpseError::busy("drift").error_code(), "BUSY");
        assert_eq!(
            GlimpseError::dimension_mismatch(384, 768).error_code(),
            "DIMENSION_MISMATCH"
        );
    }

    #[test]
    fn exit_codes_distinguish_configuration_and_corruption() {
        assert_eq!(GlimpseError::configuration("maxFileSize", "not a size").exit_code(), 2);
        assert_eq!(GlimpseError::project_not_detected("/tmp").exit_code(), 3);
        assert_eq!(GlimpseError::index_corrupt("bad version").exit_code(), 4);
    }

    #[test]
    fn busy_and_permission_denied_are_retryable() {
        assert!(GlimpseError::busy("reconcile").is_retryable());
        assert!(GlimpseError::permission_denied("/root").is_retryable());
        assert!(!GlimpseError::index_corrupt("x").is_retryable());
    }
}
