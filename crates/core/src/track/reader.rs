//! FLAC discovery and metadata reading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::TrackError;
use super::types::Track;

/// Extension of the lossless source files.
pub const SOURCE_SUFFIX: &str = "flac";

/// Finds every `.flac` file below `root`, in sorted depth-first order.
pub fn discover_tracks(root: &Path) -> Result<Vec<PathBuf>, TrackError> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| TrackError::Scan {
            path: root.to_path_buf(),
            source: e,
        })?;

        let is_source = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == SOURCE_SUFFIX);

        if is_source {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

/// Reads stream parameters and Vorbis comments of a single FLAC file.
pub fn read_track(root: &Path, path: &Path) -> Result<Track, TrackError> {
    let tag = metaflac::Tag::read_from_path(path).map_err(|e| TrackError::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;

    let info = tag
        .get_streaminfo()
        .ok_or_else(|| TrackError::MissingStreamInfo {
            path: path.to_path_buf(),
        })?;

    // Vorbis comment keys are case-insensitive
    let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(comments) = tag.vorbis_comments() {
        for (key, values) in &comments.comments {
            tags.entry(key.to_lowercase())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    let relative_path = path
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default());

    Ok(Track {
        path: path.to_path_buf(),
        relative_path,
        channels: info.num_channels,
        sample_rate: info.sample_rate,
        bits_per_sample: info.bits_per_sample,
        tags,
    })
}

/// Discovers and reads every track below `root`.
pub fn read_tracks(root: &Path) -> Result<Vec<Track>, TrackError> {
    discover_tracks(root)?
        .iter()
        .map(|path| read_track(root, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_flac_fixture, FlacFixture};
    use tempfile::TempDir;

    #[test]
    fn test_discover_tracks_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("CD2")).unwrap();
        std::fs::write(root.join("02.flac"), b"x").unwrap();
        std::fs::write(root.join("01.flac"), b"x").unwrap();
        std::fs::write(root.join("CD2/01.flac"), b"x").unwrap();
        std::fs::write(root.join("cover.jpg"), b"x").unwrap();
        std::fs::write(root.join("notes.FLAC.txt"), b"x").unwrap();

        let found = discover_tracks(root).unwrap();
        let relative: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("01.flac"),
                PathBuf::from("02.flac"),
                PathBuf::from("CD2/01.flac"),
            ]
        );
    }

    #[test]
    fn test_read_track_stream_info_and_tags() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("disc/01.flac");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let fixture = FlacFixture::new(24, 96000, 2)
            .with_tag("TITLE", "Intro")
            .with_tag("Artist", "Someone")
            .with_tag("genre", "Ambient")
            .with_tag("genre", "Drone");
        write_flac_fixture(&path, &fixture).unwrap();

        let track = read_track(temp.path(), &path).unwrap();
        assert_eq!(track.bits_per_sample, 24);
        assert_eq!(track.sample_rate, 96000);
        assert_eq!(track.channels, 2);
        assert_eq!(track.relative_path, PathBuf::from("disc/01.flac"));
        assert_eq!(track.tag("title"), Some(&["Intro".to_string()][..]));
        assert_eq!(track.tag("artist"), Some(&["Someone".to_string()][..]));
        assert_eq!(track.tag("genre").map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_read_track_not_flac() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.flac");
        std::fs::write(&path, b"definitely not a flac file").unwrap();

        let err = read_track(temp.path(), &path).unwrap_err();
        assert_eq!(err.path(), path.as_path());
    }
}
