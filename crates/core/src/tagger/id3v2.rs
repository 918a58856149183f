//! ID3v2.4 writer for MP3 outputs.

use id3::frame::{Comment, ExtendedText};
use id3::{ErrorKind, Tag, TagLike, Version};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::error::TagError;
use super::traits::TagWriter;
use crate::format::{Id3Field, Id3Vocabulary};

/// Multiple values of one text frame are separated by NUL in ID3v2.4.
const ID3_VALUE_SEPARATOR: &str = "\0";

/// A comment is free text, so merged comment values become lines.
const COMMENT_LINE_SEPARATOR: &str = "\n";

/// Maps keys through an [`Id3Vocabulary`] onto ID3 frames.
#[derive(Debug, Clone, Copy)]
pub struct Id3Writer<'a> {
    vocabulary: &'a Id3Vocabulary,
}

impl<'a> Id3Writer<'a> {
    pub fn new(vocabulary: &'a Id3Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Groups values by target frame. Several keys can alias one frame
    /// (`albumartist` and `album artist` both land in `TPE2`); their values
    /// are merged in key order without duplicates.
    fn merge_by_field<'t>(
        &self,
        tags: &'t BTreeMap<String, Vec<String>>,
    ) -> Vec<(&'a Id3Field, Vec<&'t str>)> {
        let mut frames: Vec<(&'a Id3Field, Vec<&'t str>)> = Vec::new();
        for (key, values) in tags {
            let Some(field) = self.vocabulary.field(key) else {
                debug!("No ID3 frame for {:?}, skipping", key);
                continue;
            };
            let index = match frames.iter().position(|(f, _)| *f == field) {
                Some(index) => index,
                None => {
                    frames.push((field, Vec::new()));
                    frames.len() - 1
                }
            };
            let merged = &mut frames[index].1;
            for value in values {
                if !merged.contains(&value.as_str()) {
                    merged.push(value.as_str());
                }
            }
        }
        frames
    }

    fn read_or_new(path: &Path) -> Result<Tag, TagError> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(tag),
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Ok(Tag::new()),
            Err(e) => Err(TagError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

impl TagWriter for Id3Writer<'_> {
    fn name(&self) -> &str {
        "id3v2.4"
    }

    fn write(&self, path: &Path, tags: &BTreeMap<String, Vec<String>>) -> Result<usize, TagError> {
        if !path.is_file() {
            return Err(TagError::Read {
                path: path.to_path_buf(),
                message: "no such file".to_string(),
            });
        }
        let mut tag = Self::read_or_new(path)?;
        let frames = self.merge_by_field(tags);

        for (field, values) in &frames {
            match field {
                Id3Field::Text(frame) => {
                    tag.set_text(frame.as_str(), values.join(ID3_VALUE_SEPARATOR));
                }
                Id3Field::UserText(description) => {
                    tag.add_frame(ExtendedText {
                        description: description.clone(),
                        value: values.join(ID3_VALUE_SEPARATOR),
                    });
                }
                Id3Field::Comment => {
                    tag.add_frame(Comment {
                        lang: "eng".to_string(),
                        description: String::new(),
                        text: values.join(COMMENT_LINE_SEPARATOR),
                    });
                }
            }
        }

        tag.write_to_path(path, Version::Id3v24)
            .map_err(|e| TagError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(frames.len())
    }
}
