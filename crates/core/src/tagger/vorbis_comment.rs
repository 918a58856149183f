//! Vorbis comment writer for FLAC outputs.

use metaflac::Tag;
use std::collections::BTreeMap;
use std::path::Path;

use super::error::TagError;
use super::traits::TagWriter;

/// Stores every key as a vorbis comment, keeping multiple values.
///
/// Comments already present in the file are replaced; the vendor string is
/// kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct VorbisWriter;

impl TagWriter for VorbisWriter {
    fn name(&self) -> &str {
        "vorbis"
    }

    fn write(&self, path: &Path, tags: &BTreeMap<String, Vec<String>>) -> Result<usize, TagError> {
        let mut tag = Tag::read_from_path(path).map_err(|e| TagError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let comments = tag.vorbis_comments_mut();
        comments.comments.clear();
        for (key, values) in tags {
            comments.set(key.to_uppercase(), values.clone());
        }

        tag.save().map_err(|e| TagError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(tags.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_flac_fixture, FlacFixture};

    #[test]
    fn test_writes_multi_valued_comments() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out.flac");
        write_flac_fixture(&path, &FlacFixture::new(16, 44100, 2)).unwrap();

        let mut tags = BTreeMap::new();
        tags.insert("title".to_string(), vec!["Intro".to_string()]);
        tags.insert(
            "artist".to_string(),
            vec!["A".to_string(), "B".to_string()],
        );
        assert_eq!(VorbisWriter.write(&path, &tags).unwrap(), 2);

        let tag = Tag::read_from_path(&path).unwrap();
        let comments = tag.vorbis_comments().unwrap();
        assert_eq!(comments.get("TITLE").unwrap(), &vec!["Intro".to_string()]);
        assert_eq!(comments.get("ARTIST").unwrap().len(), 2);
        assert!(tag.get_streaminfo().is_some());
    }

    #[test]
    fn test_rejects_non_flac_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out.flac");
        std::fs::write(&path, b"not a flac file").unwrap();

        let err = VorbisWriter.write(&path, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, TagError::Read { .. }));
    }
}
