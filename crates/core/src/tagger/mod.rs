//! Copying tags from a source track onto a transcoded file.
//!
//! The destination format decides the tag container: MP3 outputs get an
//! ID3v2.4 tag restricted to the keys its [`Id3Vocabulary`] can express,
//! FLAC outputs get vorbis comments carrying every key of the source.
//! Keys the schema cannot express are dropped and logged.
//!
//! [`Id3Vocabulary`]: crate::format::Id3Vocabulary

mod error;
mod id3v2;
mod traits;
mod vorbis_comment;

pub use error::TagError;
pub use id3v2::Id3Writer;
pub use traits::TagWriter;
pub use vorbis_comment::VorbisWriter;

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::format::TagSchema;
use crate::track::Track;

/// Copies `track`'s tags onto `destination` and syncs the file to disk.
///
/// Returns the number of fields written. Empty values are skipped.
pub fn copy_tags(track: &Track, destination: &Path, schema: &TagSchema) -> Result<usize, TagError> {
    let tags = representable_tags(track, schema);

    let written = match schema {
        TagSchema::Vorbis => write_with(&VorbisWriter, destination, &tags)?,
        TagSchema::Id3(vocabulary) => write_with(&Id3Writer::new(vocabulary), destination, &tags)?,
    };

    File::open(destination)
        .and_then(|f| f.sync_all())
        .map_err(|e| TagError::Sync {
            path: destination.to_path_buf(),
            source: e,
        })?;

    Ok(written)
}

fn write_with(
    writer: &dyn TagWriter,
    destination: &Path,
    tags: &BTreeMap<String, Vec<String>>,
) -> Result<usize, TagError> {
    let written = writer.write(destination, tags)?;
    debug!(
        "Wrote {} {} tags to {}",
        written,
        writer.name(),
        destination.display()
    );
    Ok(written)
}

/// The subset of `track`'s tags that `schema` can express.
fn representable_tags(track: &Track, schema: &TagSchema) -> BTreeMap<String, Vec<String>> {
    let mut tags = BTreeMap::new();
    for (key, values) in &track.tags {
        let values: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
        if values.is_empty() {
            continue;
        }
        if !schema.accepts(key) {
            debug!(
                "Dropping tag {:?} from {}: not representable",
                key,
                track.relative_path.display()
            );
            continue;
        }
        tags.insert(key.clone(), values);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn track(tags: &[(&str, &str)]) -> Track {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, v) in tags {
            map.entry(k.to_string()).or_default().push(v.to_string());
        }
        Track {
            path: PathBuf::from("/src/01.flac"),
            relative_path: PathBuf::from("01.flac"),
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            tags: map,
        }
    }

    #[test]
    fn test_representable_tags_filters_by_schema() {
        let t = track(&[
            ("title", "Intro"),
            ("artist", "Band"),
            ("my custom", "x"),
            ("genre", ""),
        ]);

        let id3 = representable_tags(&t, &TagSchema::id3());
        assert_eq!(id3.keys().collect::<Vec<_>>(), vec!["artist", "title"]);

        let vorbis = representable_tags(&t, &TagSchema::Vorbis);
        assert_eq!(
            vorbis.keys().collect::<Vec<_>>(),
            vec!["artist", "my custom", "title"]
        );
    }

    #[test]
    fn test_copy_tags_missing_file_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let t = track(&[("title", "Intro")]);
        let result = copy_tags(&t, &temp.path().join("missing.flac"), &TagSchema::Vorbis);
        assert!(matches!(result, Err(TagError::Read { .. })));
    }
}
