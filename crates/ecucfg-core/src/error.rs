//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The discovery result document does not exist.
    #[error("discovery file not found: {}", .0.display())]
    DiscoveryNotFound(PathBuf),

    /// The discovery result document is not well-formed JSON of the expected shape.
    #[error("malformed discovery document {}: {source}", path.display())]
    MalformedDiscovery {
        /// Path of the offending document.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
