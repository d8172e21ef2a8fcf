//! Error types shared across reelgraph crates.

use std::path::PathBuf;

/// Top-level error type for reelgraph operations.
///
/// The variants mirror the failure classes of a scene compilation:
/// bad project settings, bad item fields, missing media, engine
/// invocation failures and rasterization failures.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource error: {message}")]
    Resource { message: String },

    #[error("Media processing error: {message}")]
    MediaProcessing {
        message: String,
        /// Diagnostic output captured from the engine (usually stderr).
        diagnostics: Option<String>,
    },

    #[error("Rendering error: {message}")]
    Rendering { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource {
            message: msg.into(),
        }
    }

    pub fn media_processing(msg: impl Into<String>, diagnostics: Option<String>) -> Self {
        Self::MediaProcessing {
            message: msg.into(),
            diagnostics,
        }
    }

    pub fn rendering(msg: impl Into<String>) -> Self {
        Self::Rendering {
            message: msg.into(),
        }
    }

    /// Whether compilation may continue with default values after this error.
    ///
    /// Only missing or unreadable media is recoverable; it degrades to
    /// project defaults during normalization.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Resource { .. } | Self::FileNotFound { .. })
    }

    /// Captured engine diagnostics, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::MediaProcessing { diagnostics, .. } => diagnostics.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_resource_errors_are_recoverable() {
        assert!(ReelError::resource("missing clip").is_recoverable());
        assert!(ReelError::FileNotFound {
            path: PathBuf::from("a.mp4")
        }
        .is_recoverable());
        assert!(!ReelError::validation("bad opacity").is_recoverable());
        assert!(!ReelError::configuration("bad duration").is_recoverable());
        assert!(!ReelError::rendering("surface closed").is_recoverable());
    }

    #[test]
    fn test_media_processing_keeps_diagnostics() {
        let err = ReelError::media_processing("ffmpeg exited 1", Some("bad filter".into()));
        assert_eq!(err.diagnostics(), Some("bad filter"));
        assert_eq!(err.to_string(), "Media processing error: ffmpeg exited 1");
    }
}
