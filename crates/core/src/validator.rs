//! Source validation.
//!
//! A track set is transcodable when every track is mono or stereo, all tracks
//! share one bit depth and sample rate, that format has a resample plan, and
//! every track carries the required tags.

use std::path::PathBuf;
use thiserror::Error;

use crate::resample;
use crate::track::TrackSet;

/// Reasons a track set cannot be transcoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No FLAC files in the source directory.
    #[error("No FLAC files found in {path}")]
    NoTracks { path: PathBuf },

    /// More than two channels.
    #[error("More than 2 channels are not supported ({channels} in {path})")]
    UnsupportedChannels { path: PathBuf, channels: u8 },

    /// Bit depth or sample rate differs from the first track.
    #[error(
        "Inconsistent sample rate or bit depth: {path} has (bits, rate) {found:?}, expected {expected:?}"
    )]
    InconsistentFormat {
        path: PathBuf,
        expected: (u8, u32),
        found: (u8, u32),
    },

    /// Sample rate is not a multiple of 44.1 or 48 kHz.
    #[error("Unsupported Rate: {rate}Hz. Only multiples of 44.1 or 48 kHz are supported")]
    UnsupportedRate { rate: u32 },

    /// Required tags missing or empty.
    #[error("Required tags missing from {path}: {}", .missing.join(", "))]
    MissingTags { path: PathBuf, missing: Vec<String> },
}

/// Checks that `tracks` can be transcoded as one release.
pub fn validate(tracks: &TrackSet, required_tags: &[String]) -> Result<(), ValidationError> {
    if let Some(track) = tracks.iter().find(|t| t.channels > 2) {
        return Err(ValidationError::UnsupportedChannels {
            path: track.path.clone(),
            channels: track.channels,
        });
    }

    let expected = tracks.first().format();
    if let Some(track) = tracks.iter().find(|t| t.format() != expected) {
        return Err(ValidationError::InconsistentFormat {
            path: track.path.clone(),
            expected,
            found: track.format(),
        });
    }

    resample::plan(expected.0, expected.1)?;

    for track in tracks {
        let missing: Vec<String> = required_tags
            .iter()
            .filter(|key| !track.has_tag(key))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingTags {
                path: track.path.clone(),
                missing,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;
    use std::collections::BTreeMap;

    const REQUIRED: [&str; 4] = ["title", "tracknumber", "artist", "album"];

    fn required() -> Vec<String> {
        REQUIRED.iter().map(|s| s.to_string()).collect()
    }

    fn track(name: &str, channels: u8, bits: u8, rate: u32) -> Track {
        let mut tags = BTreeMap::new();
        for key in REQUIRED {
            tags.insert(key.to_string(), vec![format!("{} {}", key, name)]);
        }
        Track {
            path: PathBuf::from(format!("/src/{}.flac", name)),
            relative_path: PathBuf::from(format!("{}.flac", name)),
            channels,
            sample_rate: rate,
            bits_per_sample: bits,
            tags,
        }
    }

    fn set(tracks: Vec<Track>) -> TrackSet {
        TrackSet::new("/src", tracks).unwrap()
    }

    #[test]
    fn test_valid_set() {
        let tracks = set(vec![track("01", 2, 16, 44100), track("02", 1, 16, 44100)]);
        assert_eq!(validate(&tracks, &required()), Ok(()));
    }

    #[test]
    fn test_too_many_channels() {
        let tracks = set(vec![track("01", 2, 16, 44100), track("02", 6, 16, 44100)]);
        assert!(matches!(
            validate(&tracks, &required()),
            Err(ValidationError::UnsupportedChannels { channels: 6, .. })
        ));
    }

    #[test]
    fn test_inconsistent_format() {
        let tracks = set(vec![track("01", 2, 24, 96000), track("02", 2, 24, 48000)]);
        let err = validate(&tracks, &required()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InconsistentFormat {
                path: PathBuf::from("/src/02.flac"),
                expected: (24, 96000),
                found: (24, 48000),
            }
        );
    }

    #[test]
    fn test_channel_check_runs_before_format_check() {
        let tracks = set(vec![track("01", 2, 24, 96000), track("02", 3, 16, 44100)]);
        assert!(matches!(
            validate(&tracks, &required()),
            Err(ValidationError::UnsupportedChannels { .. })
        ));
    }

    #[test]
    fn test_unsupported_rate_surfaced() {
        let tracks = set(vec![track("01", 2, 24, 44056)]);
        assert_eq!(
            validate(&tracks, &required()),
            Err(ValidationError::UnsupportedRate { rate: 44056 })
        );
    }

    #[test]
    fn test_missing_and_empty_tags() {
        let mut second = track("02", 2, 16, 44100);
        second.tags.remove("album");
        second.tags.insert("artist".to_string(), vec![String::new()]);
        let tracks = set(vec![track("01", 2, 16, 44100), second]);

        match validate(&tracks, &required()) {
            Err(ValidationError::MissingTags { path, missing }) => {
                assert_eq!(path, PathBuf::from("/src/02.flac"));
                assert_eq!(missing, vec!["artist".to_string(), "album".to_string()]);
            }
            other => panic!("unexpected verdict: {:?}", other),
        }
    }

    #[test]
    fn test_validation_is_deterministic() {
        let mut second = track("02", 2, 16, 44100);
        second.tags.remove("title");
        let tracks = set(vec![track("01", 2, 16, 44100), second]);

        let first = validate(&tracks, &required());
        for _ in 0..5 {
            assert_eq!(validate(&tracks, &required()), first);
        }
    }
}
