//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::TranscodeStage;
use crate::ancillary::AncillaryError;
use crate::pipeline::PipelineError;
use crate::tagger::TagError;
use crate::track::TrackError;
use crate::validator::ValidationError;

/// Why a destination cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DestinationConflict {
    #[error("Destination already exists: {0}")]
    Exists(PathBuf),

    #[error("Destination parent directory does not exist: {0}")]
    ParentMissing(PathBuf),
}

/// Errors that can end a transcode run.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The destination was unusable; nothing was touched.
    #[error(transparent)]
    DestinationConflict(#[from] DestinationConflict),

    #[error("Source rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to read source tracks: {0}")]
    TrackRead(#[from] TrackError),

    #[error("Failed to create destination {path}")]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transcoding failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Tagging failed: {0}")]
    Tagging(#[from] TagError),

    #[error("Copying ancillary files failed: {0}")]
    Ancillary(#[from] AncillaryError),

    /// A blocking task panicked or was aborted.
    #[error("{stage} task failed: {message}")]
    Task {
        stage: TranscodeStage,
        message: String,
    },
}

impl TranscodeError {
    /// The stage in which the error arose.
    pub fn stage(&self) -> TranscodeStage {
        match self {
            Self::DestinationConflict(_) => TranscodeStage::Validating,
            Self::Validation(_) | Self::TrackRead(_) => TranscodeStage::Validating,
            Self::DestinationCreate { .. } => TranscodeStage::CreatingDestination,
            Self::Pipeline(PipelineError::CreateDirectory { .. }) => {
                TranscodeStage::CreatingDestination
            }
            Self::Pipeline(_) => TranscodeStage::Transcoding,
            Self::Tagging(_) => TranscodeStage::Tagging,
            Self::Ancillary(_) => TranscodeStage::CopyingAncillary,
            Self::Task { stage, .. } => *stage,
        }
    }

    /// Whether running the same transcode again could succeed.
    ///
    /// Only I/O failures qualify; rejected sources and conflicting
    /// destinations stay rejected.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DestinationConflict(_) | Self::Validation(_) => false,
            Self::TrackRead(_) | Self::DestinationCreate { .. } => true,
            Self::Pipeline(e) => e.is_retryable(),
            Self::Tagging(TagError::Sync { .. }) => true,
            Self::Tagging(_) => false,
            Self::Ancillary(_) => true,
            Self::Task { .. } => false,
        }
    }
}
