//! Tag schemas: which keys a destination container can represent.
//!
//! Vorbis comments accept any key. ID3 only stores keys that map to a frame,
//! so the ID3 schema carries an explicit lookup table from easy tag names
//! to frames. The table is a plain value handed to the tag propagator.

use std::collections::HashMap;

/// Where an easy tag key is stored inside an ID3v2.4 tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Id3Field {
    /// A standard text frame such as `TIT2`.
    Text(String),
    /// A `TXXX` user text frame with the given description.
    UserText(String),
    /// A `COMM` frame with an empty description.
    Comment,
}

/// Lookup table from lower-case tag keys to ID3 fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Id3Vocabulary {
    fields: HashMap<String, Id3Field>,
}

const TEXT_FRAMES: &[(&str, &str)] = &[
    ("album", "TALB"),
    ("bpm", "TBPM"),
    ("compilation", "TCMP"),
    ("composer", "TCOM"),
    ("copyright", "TCOP"),
    ("encodedby", "TENC"),
    ("lyricist", "TEXT"),
    ("length", "TLEN"),
    ("media", "TMED"),
    ("mood", "TMOO"),
    ("title", "TIT2"),
    ("version", "TIT3"),
    ("artist", "TPE1"),
    ("conductor", "TPE3"),
    ("arranger", "TPE4"),
    ("discnumber", "TPOS"),
    ("organization", "TPUB"),
    ("tracknumber", "TRCK"),
    ("author", "TOLY"),
    ("albumartistsort", "TSO2"),
    ("albumsort", "TSOA"),
    ("composersort", "TSOC"),
    ("artistsort", "TSOP"),
    ("titlesort", "TSOT"),
    ("isrc", "TSRC"),
    ("discsubtitle", "TSST"),
    ("language", "TLAN"),
    ("genre", "TCON"),
    ("date", "TDRC"),
    // Extensions over the stock easy-ID3 key set
    ("albumartist", "TPE2"),
    ("album artist", "TPE2"),
    ("grouping", "TIT1"),
    ("content group", "TIT1"),
    ("originaldate", "TDOR"),
    ("original release date", "TDOR"),
];

const USER_TEXT_FRAMES: &[(&str, &str)] = &[
    ("musicbrainz_artistid", "MusicBrainz Artist Id"),
    ("musicbrainz_albumid", "MusicBrainz Album Id"),
    ("musicbrainz_albumartistid", "MusicBrainz Album Artist Id"),
    ("musicbrainz_releasetrackid", "MusicBrainz Release Track Id"),
    ("musicbrainz_releasegroupid", "MusicBrainz Release Group Id"),
    ("musicbrainz_albumstatus", "MusicBrainz Album Status"),
    ("musicbrainz_albumtype", "MusicBrainz Album Type"),
    ("releasecountry", "MusicBrainz Album Release Country"),
    ("barcode", "BARCODE"),
    ("catalognumber", "CATALOGNUMBER"),
    ("asin", "ASIN"),
    ("acoustid_id", "Acoustid Id"),
];

const COMMENT_KEYS: &[&str] = &["comment", "description"];

impl Id3Vocabulary {
    /// The default easy-key table, including the album artist, grouping,
    /// comment and original date extensions.
    pub fn standard() -> Self {
        let mut vocabulary = Self::default();
        for (key, frame) in TEXT_FRAMES {
            vocabulary.insert(*key, Id3Field::Text(frame.to_string()));
        }
        for (key, description) in USER_TEXT_FRAMES {
            vocabulary.insert(*key, Id3Field::UserText(description.to_string()));
        }
        for key in COMMENT_KEYS {
            vocabulary.insert(*key, Id3Field::Comment);
        }
        vocabulary
    }

    /// Adds or replaces a key mapping.
    pub fn insert(&mut self, key: impl Into<String>, field: Id3Field) {
        self.fields.insert(key.into().to_lowercase(), field);
    }

    /// Adds a key mapping, builder style.
    pub fn with_key(mut self, key: impl Into<String>, field: Id3Field) -> Self {
        self.insert(key, field);
        self
    }

    /// Field for `key`, if representable.
    pub fn field(&self, key: &str) -> Option<&Id3Field> {
        self.fields.get(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The set of tag keys a destination container can represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSchema {
    /// FLAC / Vorbis comments: any key.
    Vorbis,
    /// ID3v2.4 restricted to a vocabulary.
    Id3(Id3Vocabulary),
}

impl TagSchema {
    /// ID3 schema with the standard vocabulary.
    pub fn id3() -> Self {
        Self::Id3(Id3Vocabulary::standard())
    }

    /// Whether `key` can be stored in this container.
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            Self::Vorbis => !key.is_empty() && !key.contains('='),
            Self::Id3(vocabulary) => vocabulary.field(key).is_some(),
        }
    }
}
