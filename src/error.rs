//! Error types for codehut-access.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised inside the access subsystem.
///
/// None of these reach the caller of [`crate::AccessResolver::is_accessible`];
/// they are logged and folded into a deny or a cache fallback.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The local key-value store could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// The remote purchase authority failed or answered with a non-2xx status.
    #[error("remote authority error: {0}")]
    Remote(String),

    /// The remote purchase authority did not answer before the deadline.
    #[error("remote authority timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snippet failed validation.
    #[error("invalid snippet: {0}")]
    InvalidSnippet(String),

    /// The user reference failed validation.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Remote(e.to_string())
    }
}
