//! Error types for the track module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading source tracks.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The source directory could not be walked.
    #[error("Failed to scan source directory {path}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The FLAC metadata blocks could not be parsed.
    #[error("Failed to read FLAC metadata from {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: metaflac::Error,
    },

    /// The file has no STREAMINFO block.
    #[error("Missing STREAMINFO block in {path}")]
    MissingStreamInfo { path: PathBuf },
}

impl TrackError {
    /// Path of the file or directory the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Scan { path, .. }
            | Self::Metadata { path, .. }
            | Self::MissingStreamInfo { path } => path,
        }
    }
}
