//! Builds process chains for individual tracks.

use std::path::{Path, PathBuf};

use super::types::{PipelineSpec, StageCommand};
use crate::config::ToolsConfig;
use crate::format::TargetFormat;
use crate::resample::{ResamplePlan, TARGET_BITS};
use crate::track::Track;

/// Turns tracks into [`PipelineSpec`]s using the configured codec programs.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    tools: ToolsConfig,
}

impl PipelineBuilder {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// Output path for `track` under `dest_root`: same relative path, format suffix.
    pub fn destination_for(track: &Track, dest_root: &Path, format: TargetFormat) -> PathBuf {
        dest_root
            .join(&track.relative_path)
            .with_extension(format.suffix().trim_start_matches('.'))
    }

    /// First stage: decode to WAV on stdout, resampling when planned.
    pub fn decode_command(&self, source: &Path, plan: ResamplePlan) -> StageCommand {
        match plan {
            ResamplePlan::Resample { rate } => StageCommand::new(&self.tools.sox)
                .arg(source)
                .args(["-G", "-b"])
                .arg(TARGET_BITS.to_string())
                .args(["-t", "wav", "-", "rate", "-v", "-L"])
                .arg(rate.to_string())
                .arg("dither"),
            ResamplePlan::Keep => StageCommand::new(&self.tools.flac)
                .args(["-dcs", "--"])
                .arg(source),
        }
    }

    /// Builds the decode → encode chain for one track.
    pub fn build(
        &self,
        index: usize,
        track: &Track,
        destination: PathBuf,
        format: TargetFormat,
        plan: ResamplePlan,
    ) -> PipelineSpec {
        let stages = vec![
            self.decode_command(&track.path, plan),
            format.encode_command(&destination, &self.tools),
        ];

        PipelineSpec {
            index,
            source: track.path.clone(),
            destination,
            stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn track(relative: &str) -> Track {
        Track {
            path: Path::new("/src").join(relative),
            relative_path: PathBuf::from(relative),
            channels: 2,
            sample_rate: 96000,
            bits_per_sample: 24,
            tags: BTreeMap::new(),
        }
    }

    #[test]
    fn test_destination_mirrors_layout() {
        let t = track("CD1/01. Intro.flac");
        let dest = PipelineBuilder::destination_for(&t, Path::new("/out"), TargetFormat::Mp3V0);
        assert_eq!(dest, PathBuf::from("/out/CD1/01. Intro.mp3"));

        let dest = PipelineBuilder::destination_for(&t, Path::new("/out"), TargetFormat::Flac16);
        assert_eq!(dest, PathBuf::from("/out/CD1/01. Intro.flac"));
    }

    #[test]
    fn test_build_without_resample() {
        let builder = PipelineBuilder::default();
        let t = track("01.flac");
        let spec = builder.build(
            3,
            &t,
            PathBuf::from("/out/01.mp3"),
            TargetFormat::Mp3Cbr320,
            ResamplePlan::Keep,
        );

        assert_eq!(spec.index, 3);
        assert_eq!(spec.stages.len(), 2);
        assert_eq!(spec.stages[0].program, PathBuf::from("flac"));
        assert_eq!(spec.stages[0].args_lossy(), vec!["-dcs", "--", "/src/01.flac"]);
        assert_eq!(spec.stages[1].program, PathBuf::from("lame"));
        assert_eq!(spec.stages[1].args_lossy().last().unwrap(), "/out/01.mp3");
    }

    #[test]
    fn test_build_with_resample() {
        let builder = PipelineBuilder::new(ToolsConfig {
            sox: PathBuf::from("/usr/bin/sox"),
            ..Default::default()
        });
        let t = track("01.flac");
        let spec = builder.build(
            0,
            &t,
            PathBuf::from("/out/01.mp3"),
            TargetFormat::Mp3V0,
            ResamplePlan::Resample { rate: 48000 },
        );

        assert_eq!(spec.stages[0].program, PathBuf::from("/usr/bin/sox"));
        assert_eq!(
            spec.stages[0].args_lossy(),
            vec![
                "/src/01.flac", "-G", "-b", "16", "-t", "wav", "-", "rate", "-v", "-L", "48000",
                "dither"
            ]
        );
        assert!(spec.stages[1].args_lossy().contains(&"--vbr-new".to_string()));
    }
}
