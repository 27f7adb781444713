//! Error types for watch operations
//!
//! Registration, primitive and encoding failures are all recoverable:
//! they are logged by the component that hits them and never reach the
//! consumer of the event stream.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for watch operations
#[derive(Debug, Error)]
pub enum WatchError {
    /// Watch target does not exist at registration time
    #[error("Path not found: {path:?}")]
    PathNotFound { path: PathBuf },

    /// The notification backend refused a path
    #[error("Failed to register {path:?}: {source}")]
    Registration {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Directory walk failed on an entry
    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Raw error reported by the notification backend
    #[error("Watch error: {0}")]
    Primitive(#[from] notify::Error),

    /// A classified event could not be serialized
    #[error("Failed to encode event for {path:?}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file is malformed
    #[error("Configuration error in {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;
