//! Types for the transcoder module.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::ancillary::AncillaryReport;
use crate::format::TargetFormat;
use crate::resample::ResamplePlan;

/// Lifecycle state of a transcode run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeStage {
    Validating,
    Planning,
    BuildingPipelines,
    CreatingDestination,
    Transcoding,
    Tagging,
    CopyingAncillary,
    Done,
    Failed,
}

impl TranscodeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Planning => "planning",
            Self::BuildingPipelines => "building_pipelines",
            Self::CreatingDestination => "creating_destination",
            Self::Transcoding => "transcoding",
            Self::Tagging => "tagging",
            Self::CopyingAncillary => "copying_ancillary",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for TranscodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress updates for a transcode run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscodeProgress {
    /// The run entered a new stage.
    Stage { stage: TranscodeStage },
    /// One more track finished encoding.
    TrackEncoded { completed: usize, total: usize },
    /// The run finished successfully.
    Completed { tracks: usize },
    /// The run failed; the destination has been rolled back.
    Failed { stage: TranscodeStage, error: String },
}

/// Result of a successful transcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscodeReport {
    /// Target format.
    pub format: TargetFormat,
    /// Number of tracks transcoded.
    pub tracks: usize,
    /// Output audio files, in track order.
    pub outputs: Vec<PathBuf>,
    /// Resample plan applied to every track.
    pub plan: ResamplePlan,
    /// Non-audio files copied.
    pub ancillary: AncillaryReport,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}
