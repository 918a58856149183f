//! Transcode engine for lossless music releases.
//!
//! Turns a directory of FLAC tracks into an MP3 320, V0 or V2, or a 16-bit FLAC
//! derivative by driving external `flac`, `sox` and `lame` processes, then
//! copies tags and non-audio files. Output is all-or-nothing: a failed run
//! leaves no destination directory behind.

pub mod ancillary;
pub mod config;
pub mod format;
pub mod metrics;
pub mod pipeline;
pub mod resample;
pub mod tagger;
pub mod testing;
pub mod track;
pub mod transcoder;
pub mod validator;

pub use ancillary::{copy_ancillary, AncillaryError, AncillaryReport};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ToolsConfig, TranscodeConfig,
};
pub use format::{Id3Field, Id3Vocabulary, ParseFormatError, TagSchema, TargetFormat};
pub use pipeline::{
    ExecutionReport, PipelineBuilder, PipelineError, PipelineEvent, PipelineExecutor,
    PipelineSpec, ProcessChain, StageCommand,
};
pub use resample::{plan as plan_resample, ResamplePlan};
pub use tagger::{copy_tags, TagError, TagWriter};
pub use track::{Track, TrackError, TrackSet};
pub use transcoder::{
    DestinationConflict, TranscodeError, TranscodeProgress, TranscodeReport, TranscodeStage,
    Transcoder,
};
pub use validator::{validate, ValidationError};
