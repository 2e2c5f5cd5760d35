// Error types for the avatar pipeline.
// Library code returns `AvatarError`; the binary and the terminal UI wrap
// it in `anyhow` with extra context. Per-call Slack failures are
// `api::ApiError` and never escape the uploader. Messages never include tokens.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Asset directory missing or holding no usable images.
    #[error("{0}")]
    NotFound(String),

    #[error("Could not read image '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Could not write '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("No Slack token available")]
    CredentialMissing,

    /// Credential store unreadable or corrupt.
    #[error("Credential store '{}' is unusable: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Credential prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}

impl AvatarError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        AvatarError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        AvatarError::Config {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// True for the selection failures the CLI answers with the
    /// "add some PNG images" hint.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AvatarError::NotFound(_))
    }
}
