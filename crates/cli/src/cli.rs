//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

use better_core::TargetFormat;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "better.toml";

/// Transcode a FLAC release into an MP3 or 16-bit FLAC derivative.
#[derive(Debug, Parser)]
#[command(name = "better", version, about)]
pub struct Cli {
    /// Configuration file (TOML). Missing default file means built-in defaults.
    #[arg(short, long, env = "BETTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of tracks encoded at once (defaults to the CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the transcode report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Directory holding the FLAC release
    pub source: PathBuf,

    /// Directory to create for the transcoded release
    pub destination: PathBuf,

    /// Target format: 320, V0, V2 or FLAC16
    #[arg(value_parser = parse_format)]
    pub format: TargetFormat,
}

fn parse_format(s: &str) -> Result<TargetFormat, String> {
    s.parse::<TargetFormat>().map_err(|e| e.to_string())
}
