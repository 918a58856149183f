//! Types for the track module.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::validator::ValidationError;

/// One lossless source file and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    /// Absolute (or caller-relative) path of the source file.
    pub path: PathBuf,
    /// Path relative to the source directory root.
    pub relative_path: PathBuf,
    /// Number of audio channels.
    pub channels: u8,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u8,
    /// Tag key (lower case) to values, in file order.
    pub tags: BTreeMap<String, Vec<String>>,
}

impl Track {
    /// Returns the values stored under `key`, if any.
    pub fn tag(&self, key: &str) -> Option<&[String]> {
        self.tags.get(&key.to_lowercase()).map(Vec::as_slice)
    }

    /// Whether `key` holds at least one non-empty value.
    pub fn has_tag(&self, key: &str) -> bool {
        self.tag(key)
            .map(|values| values.iter().any(|v| !v.is_empty()))
            .unwrap_or(false)
    }

    /// The (bit depth, sample rate) pair that must match across a set.
    pub fn format(&self) -> (u8, u32) {
        (self.bits_per_sample, self.sample_rate)
    }
}

/// Ordered, non-empty collection of tracks from one source directory.
#[derive(Debug, Clone)]
pub struct TrackSet {
    root: PathBuf,
    tracks: Vec<Track>,
}

impl TrackSet {
    /// Creates a track set, rejecting an empty track list.
    pub fn new(root: impl Into<PathBuf>, tracks: Vec<Track>) -> Result<Self, ValidationError> {
        let root = root.into();
        if tracks.is_empty() {
            return Err(ValidationError::NoTracks { path: root });
        }
        Ok(Self { root, tracks })
    }

    /// The source directory the tracks were read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The first track; its format is the reference for the whole set.
    pub fn first(&self) -> &Track {
        &self.tracks[0]
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(tags: &[(&str, &str)]) -> Track {
        Track {
            path: PathBuf::from("/src/01.flac"),
            relative_path: PathBuf::from("01.flac"),
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
                .collect(),
        }
    }

    #[test]
    fn test_has_tag_ignores_empty_values() {
        let t = track(&[("title", "Song"), ("artist", "")]);
        assert!(t.has_tag("title"));
        assert!(t.has_tag("TITLE"));
        assert!(!t.has_tag("artist"));
        assert!(!t.has_tag("album"));
    }

    #[test]
    fn test_empty_track_set_rejected() {
        let result = TrackSet::new("/src", Vec::new());
        assert!(matches!(result, Err(ValidationError::NoTracks { .. })));
    }

    #[test]
    fn test_track_set_first() {
        let set = TrackSet::new("/src", vec![track(&[("title", "A")]), track(&[])]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.first().has_tag("title"));
        assert_eq!(set.root(), Path::new("/src"));
    }
}
