//! Synthetic FLAC files.

use metaflac::block::{Block, StreamInfo};
use metaflac::Tag;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Stream info and tags of a synthetic FLAC file.
///
/// The file carries valid metadata blocks followed by a short payload instead
/// of real audio frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacFixture {
    pub bits_per_sample: u8,
    pub sample_rate: u32,
    pub channels: u8,
    pub tags: BTreeMap<String, Vec<String>>,
    pub payload: Vec<u8>,
}

impl FlacFixture {
    pub fn new(bits_per_sample: u8, sample_rate: u32, channels: u8) -> Self {
        Self {
            bits_per_sample,
            sample_rate,
            channels,
            tags: BTreeMap::new(),
            payload: b"AUDIO".to_vec(),
        }
    }

    /// Adds a vorbis comment value; repeated keys become multi-valued.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    /// Replaces the bytes written after the metadata blocks.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Writes `fixture` to `path`, replacing any existing file.
pub fn write_flac_fixture(path: &Path, fixture: &FlacFixture) -> Result<(), metaflac::Error> {
    let mut info = StreamInfo::new();
    info.min_block_size = 4096;
    info.max_block_size = 4096;
    info.sample_rate = fixture.sample_rate;
    info.num_channels = fixture.channels;
    info.bits_per_sample = fixture.bits_per_sample;
    info.total_samples = u64::from(fixture.sample_rate);
    info.md5 = vec![0; 16];

    let mut tag = Tag::new();
    tag.push_block(Block::StreamInfo(info));
    for (key, values) in &fixture.tags {
        tag.vorbis_comments_mut().set(key.clone(), values.clone());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    tag.write_to(&mut file)?;
    file.write_all(&fixture.payload)?;
    Ok(())
}
