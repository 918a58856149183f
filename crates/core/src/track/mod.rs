//! Source track model and FLAC metadata reading.
//!
//! A [`Track`] is a read-once snapshot of one lossless source file: its
//! stream parameters and its Vorbis comments. A [`TrackSet`] is the ordered,
//! non-empty collection of tracks found under one source directory.

mod error;
mod reader;
mod types;

pub use error::TrackError;
pub use reader::{discover_tracks, read_track, read_tracks, SOURCE_SUFFIX};
pub use types::{Track, TrackSet};
