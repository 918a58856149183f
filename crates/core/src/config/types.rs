use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Transcode engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Number of pipelines run at once. Defaults to the CPU count.
    #[serde(default)]
    pub max_parallel: Option<usize>,
    /// Suffixes (with leading dot) of non-audio files copied into the output.
    #[serde(default = "default_ancillary_suffixes")]
    pub ancillary_suffixes: Vec<String>,
    /// Tags every source track must carry.
    #[serde(default = "default_required_tags")]
    pub required_tags: Vec<String>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_parallel: None,
            ancillary_suffixes: default_ancillary_suffixes(),
            required_tags: default_required_tags(),
        }
    }
}

impl TranscodeConfig {
    /// Effective worker count, never below one.
    pub fn parallelism(&self) -> usize {
        self.max_parallel.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Sets the worker count.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = Some(max);
        self
    }
}

fn default_ancillary_suffixes() -> Vec<String> {
    [
        ".cue", ".gif", ".jpeg", ".jpg", ".log", ".md5", ".nfo", ".pdf", ".png", ".sfv", ".txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_required_tags() -> Vec<String> {
    ["title", "tracknumber", "artist", "album"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Paths of the external codec programs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_flac")]
    pub flac: PathBuf,
    #[serde(default = "default_sox")]
    pub sox: PathBuf,
    #[serde(default = "default_lame")]
    pub lame: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            flac: default_flac(),
            sox: default_sox(),
            lame: default_lame(),
        }
    }
}

fn default_flac() -> PathBuf {
    PathBuf::from("flac")
}

fn default_sox() -> PathBuf {
    PathBuf::from("sox")
}

fn default_lame() -> PathBuf {
    PathBuf::from("lame")
}
