//! Error types for the pipeline module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running process pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage could not be started.
    #[error("Failed to start {program} for {path}: {source}")]
    Spawn {
        path: PathBuf,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stage exited with a non-zero status.
    #[error("{program} (stage {stage}) exited with code {code} while transcoding {path}")]
    StageFailed {
        path: PathBuf,
        stage: usize,
        program: String,
        code: i32,
        stderr: Option<String>,
    },

    /// A stage was terminated by a signal.
    #[error("{program} (stage {stage}) was killed{} while transcoding {path}", signal_suffix(.signal))]
    StageKilled {
        path: PathBuf,
        stage: usize,
        program: String,
        signal: Option<i32>,
        stderr: Option<String>,
    },

    /// Waiting for a stage failed.
    #[error("Failed to wait for {program} while transcoding {path}")]
    Wait {
        path: PathBuf,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The output directory for a pipeline could not be created.
    #[error("Failed to create output directory: {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pipeline was torn down because another one failed.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// A worker task panicked or was aborted.
    #[error("Pipeline worker failed: {0}")]
    Worker(String),
}

fn signal_suffix(signal: &Option<i32>) -> String {
    signal
        .map(|s| format!(" by signal {}", s))
        .unwrap_or_default()
}

impl PipelineError {
    /// Captured stderr tail of the failing stage, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stderr, .. } | Self::StageKilled { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }

    /// Source track the failure belongs to, if any.
    pub fn track_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Spawn { path, .. }
            | Self::StageFailed { path, .. }
            | Self::StageKilled { path, .. }
            | Self::Wait { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Wait { .. } | Self::CreateDirectory { .. } | Self::StageKilled { .. }
        )
    }
}
