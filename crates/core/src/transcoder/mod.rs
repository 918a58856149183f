//! Transcode orchestrator: one release in, one derivative out, or nothing.
//!
//! The [`Transcoder`] drives a run through its stages:
//!
//! `Validating → Planning → BuildingPipelines → CreatingDestination →
//! Transcoding → Tagging → CopyingAncillary → Done`
//!
//! A run that fails before the destination exists has no side effects. A run
//! that fails after it removes the whole destination tree before returning
//! the error.
//!
//! # Example
//!
//! ```ignore
//! use better_core::{Config, TargetFormat, Transcoder};
//!
//! let transcoder = Transcoder::new(Config::default());
//! let report = transcoder
//!     .transcode(Path::new("/music/Album [FLAC]"), Path::new("/music/Album [320]"), TargetFormat::Mp3Cbr320)
//!     .await?;
//! println!("{} tracks in {} ms", report.tracks, report.duration_ms);
//! ```

mod error;
mod runner;
mod types;

pub use error::{DestinationConflict, TranscodeError};
pub use runner::Transcoder;
pub use types::{TranscodeProgress, TranscodeReport, TranscodeStage};
