//! Types for the format module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::schema::TagSchema;
use crate::config::ToolsConfig;
use crate::pipeline::StageCommand;

/// A derivative format a release can be transcoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    /// MP3, constant 320 kbps
    Mp3Cbr320,
    /// MP3, VBR V0
    Mp3V0,
    /// MP3, VBR V2
    Mp3V2,
    /// FLAC, 16 bit
    Flac16,
}

impl TargetFormat {
    /// All supported formats.
    pub const ALL: [TargetFormat; 4] = [Self::Mp3Cbr320, Self::Mp3V0, Self::Mp3V2, Self::Flac16];

    /// Human readable name, as used in release titles.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mp3Cbr320 => "320",
            Self::Mp3V0 => "V0",
            Self::Mp3V2 => "V2",
            Self::Flac16 => "FLAC",
        }
    }

    /// Output file suffix, including the dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Mp3Cbr320 | Self::Mp3V0 | Self::Mp3V2 => ".mp3",
            Self::Flac16 => ".flac",
        }
    }

    /// Encoder stage reading WAV from stdin and writing `dest`.
    pub fn encode_command(&self, dest: &Path, tools: &ToolsConfig) -> StageCommand {
        match self {
            Self::Mp3Cbr320 => StageCommand::new(&tools.lame)
                .args(["-S", "-h", "-b", "320", "--ignore-tag-errors", "-"])
                .arg(dest),
            Self::Mp3V0 => StageCommand::new(&tools.lame)
                .args(["-S", "-V", "0", "--vbr-new", "--ignore-tag-errors", "-"])
                .arg(dest),
            Self::Mp3V2 => StageCommand::new(&tools.lame)
                .args(["-S", "-V", "2", "--vbr-new", "--ignore-tag-errors", "-"])
                .arg(dest),
            Self::Flac16 => StageCommand::new(&tools.flac)
                .args(["-s", "-8", "-o"])
                .arg(dest)
                .arg("-"),
        }
    }

    /// Tag keys the output container can represent.
    pub fn tag_schema(&self) -> TagSchema {
        match self {
            Self::Mp3Cbr320 | Self::Mp3V0 | Self::Mp3V2 => TagSchema::id3(),
            Self::Flac16 => TagSchema::Vorbis,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown target format: {0} (expected one of 320, V0, V2, FLAC)")]
pub struct ParseFormatError(pub String);

impl FromStr for TargetFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "320" | "mp3-320" | "mp3_cbr320" | "mp3cbr320" => Ok(Self::Mp3Cbr320),
            "v0" | "mp3-v0" | "mp3_v0" | "mp3v0" => Ok(Self::Mp3V0),
            "v2" | "mp3-v2" | "mp3_v2" | "mp3v2" => Ok(Self::Mp3V2),
            "flac" | "flac16" | "flac-16" | "flac 16" => Ok(Self::Flac16),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}
