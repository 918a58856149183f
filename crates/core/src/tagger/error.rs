//! Error types for the tagger module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing tags.
#[derive(Debug, Error)]
pub enum TagError {
    /// The destination's existing tag could not be read.
    #[error("Failed to read tags from {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// The tag could not be written.
    #[error("Failed to write tags to {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// The tagged file could not be flushed to disk.
    #[error("Failed to sync {path}")]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TagError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } | Self::Sync { path, .. } => path,
        }
    }
}
