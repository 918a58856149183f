//! The transcode orchestrator.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::error::{DestinationConflict, TranscodeError};
use super::types::{TranscodeProgress, TranscodeReport, TranscodeStage};
use crate::ancillary::{self, AncillaryReport};
use crate::config::Config;
use crate::format::TargetFormat;
use crate::metrics;
use crate::pipeline::{PipelineBuilder, PipelineEvent, PipelineExecutor, PipelineSpec};
use crate::resample::{self, ResamplePlan};
use crate::tagger;
use crate::track::{self, TrackSet};
use crate::validator;

/// Everything decided before the destination is touched.
struct RunPlan {
    tracks: TrackSet,
    plan: ResamplePlan,
    pipelines: Vec<PipelineSpec>,
}

/// Transcodes whole releases with all-or-nothing output.
///
/// A `Transcoder` holds no per-run state, so one instance can drive several
/// transcodes concurrently as long as their destinations differ.
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: Config,
    builder: PipelineBuilder,
    executor: PipelineExecutor,
}

impl Transcoder {
    pub fn new(config: Config) -> Self {
        let builder = PipelineBuilder::new(config.tools.clone());
        let executor = PipelineExecutor::new(config.transcode.parallelism());
        Self {
            config,
            builder,
            executor,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcodes the release in `source` into a new directory `destination`.
    ///
    /// `destination` must not exist and its parent must be a directory. On
    /// error, `destination` does not exist afterwards.
    pub async fn transcode(
        &self,
        source: &Path,
        destination: &Path,
        format: TargetFormat,
    ) -> Result<TranscodeReport, TranscodeError> {
        self.run(source, destination, format, None).await
    }

    /// Like [`transcode`](Self::transcode), reporting progress on `progress_tx`.
    ///
    /// Progress is sent without blocking: while the channel is full or its
    /// receiver is gone, updates are dropped and the transcode carries on.
    pub async fn transcode_with_progress(
        &self,
        source: &Path,
        destination: &Path,
        format: TargetFormat,
        progress_tx: mpsc::Sender<TranscodeProgress>,
    ) -> Result<TranscodeReport, TranscodeError> {
        self.run(source, destination, format, Some(&progress_tx))
            .await
    }

    async fn run(
        &self,
        source: &Path,
        destination: &Path,
        format: TargetFormat,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<TranscodeReport, TranscodeError> {
        let start = Instant::now();
        info!(
            "Transcoding {} -> {} ({})",
            source.display(),
            destination.display(),
            format
        );

        let result = self
            .run_stages(source, destination, format, progress_tx, start)
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(report) => {
                metrics::TRANSCODES_TOTAL.with_label_values(&["success"]).inc();
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);
                metrics::TRACKS_TRANSCODED.inc_by(report.tracks as u64);
                info!(
                    tracks = report.tracks,
                    duration_ms = report.duration_ms,
                    "Transcode of {} complete",
                    destination.display()
                );
                send(progress_tx, TranscodeProgress::Completed {
                    tracks: report.tracks,
                });
            }
            Err(e) => {
                let label = if e.stage() == TranscodeStage::Validating {
                    "rejected"
                } else {
                    "failed"
                };
                metrics::TRANSCODES_TOTAL.with_label_values(&[label]).inc();
                metrics::TRANSCODE_DURATION
                    .with_label_values(&[label])
                    .observe(elapsed);
                warn!(stage = %e.stage(), "Transcode of {} failed: {}", source.display(), e);
                enter(progress_tx, TranscodeStage::Failed);
                send(progress_tx, TranscodeProgress::Failed {
                    stage: e.stage(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn run_stages(
        &self,
        source: &Path,
        destination: &Path,
        format: TargetFormat,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
        start: Instant,
    ) -> Result<TranscodeReport, TranscodeError> {
        check_destination(destination)?;

        let run = self
            .plan_run(source, destination, format, progress_tx)
            .await?;

        enter(progress_tx, TranscodeStage::CreatingDestination);
        tokio::fs::create_dir(destination)
            .await
            .map_err(|e| TranscodeError::DestinationCreate {
                path: destination.to_path_buf(),
                source: e,
            })?;

        match self
            .produce(source, destination, format, &run, progress_tx)
            .await
        {
            Ok(ancillary) => {
                enter(progress_tx, TranscodeStage::Done);
                Ok(TranscodeReport {
                    format,
                    tracks: run.tracks.len(),
                    outputs: run
                        .pipelines
                        .iter()
                        .map(|p| p.destination.clone())
                        .collect(),
                    plan: run.plan,
                    ancillary,
                    duration_ms: start.elapsed().as_millis() as u64,
                })
            }
            Err(e) => {
                rollback(destination).await;
                Err(e)
            }
        }
    }

    /// Validating, Planning and BuildingPipelines. No side effects.
    async fn plan_run(
        &self,
        source: &Path,
        destination: &Path,
        format: TargetFormat,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<RunPlan, TranscodeError> {
        enter(progress_tx, TranscodeStage::Validating);
        let root = source.to_path_buf();
        let read_root = root.clone();
        let tracks = tokio::task::spawn_blocking(move || track::read_tracks(&read_root))
            .await
            .map_err(|e| TranscodeError::Task {
                stage: TranscodeStage::Validating,
                message: e.to_string(),
            })??;
        let tracks = TrackSet::new(root, tracks)?;
        validator::validate(&tracks, &self.config.transcode.required_tags)?;
        debug!("{} source tracks validated", tracks.len());

        enter(progress_tx, TranscodeStage::Planning);
        let (bits, rate) = tracks.first().format();
        let plan = resample::plan(bits, rate)?;
        info!("Resample plan for {}-bit {} Hz source: {}", bits, rate, plan);

        enter(progress_tx, TranscodeStage::BuildingPipelines);
        let pipelines: Vec<PipelineSpec> = tracks
            .iter()
            .enumerate()
            .map(|(index, track)| {
                let output = PipelineBuilder::destination_for(track, destination, format);
                self.builder.build(index, track, output, format, plan)
            })
            .collect();
        for spec in &pipelines {
            debug!(pipeline = spec.index, "Planned: {}", describe(spec));
        }

        Ok(RunPlan {
            tracks,
            plan,
            pipelines,
        })
    }

    /// Everything after the destination root exists.
    async fn produce(
        &self,
        source: &Path,
        destination: &Path,
        format: TargetFormat,
        run: &RunPlan,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<AncillaryReport, TranscodeError> {
        for spec in &run.pipelines {
            spec.prepare().await?;
        }

        enter(progress_tx, TranscodeStage::Transcoding);
        self.execute(run.pipelines.clone(), progress_tx).await?;

        enter(progress_tx, TranscodeStage::Tagging);
        let schema = format.tag_schema();
        let tasks = run
            .tracks
            .iter()
            .zip(&run.pipelines)
            .map(|(track, spec)| {
                let track = track.clone();
                let output = spec.destination.clone();
                let schema = schema.clone();
                tokio::task::spawn_blocking(move || tagger::copy_tags(&track, &output, &schema))
            });
        let tagged = futures::future::try_join_all(tasks)
            .await
            .map_err(|e| TranscodeError::Task {
                stage: TranscodeStage::Tagging,
                message: e.to_string(),
            })?;
        let keys: usize = tagged.into_iter().sum::<Result<usize, _>>()?;
        debug!("Wrote {} tag keys", keys);

        enter(progress_tx, TranscodeStage::CopyingAncillary);
        let src = source.to_path_buf();
        let dst = destination.to_path_buf();
        let suffixes = self.config.transcode.ancillary_suffixes.clone();
        let ancillary =
            tokio::task::spawn_blocking(move || ancillary::copy_ancillary(&src, &dst, &suffixes))
                .await
                .map_err(|e| TranscodeError::Task {
                    stage: TranscodeStage::CopyingAncillary,
                    message: e.to_string(),
                })??;
        info!(
            copied = ancillary.copied.len(),
            warnings = ancillary.warnings.len(),
            "Ancillary files copied"
        );

        Ok(ancillary)
    }

    /// Runs the pipelines, turning executor events into track progress.
    async fn execute(
        &self,
        pipelines: Vec<PipelineSpec>,
        progress_tx: Option<&mpsc::Sender<TranscodeProgress>>,
    ) -> Result<(), TranscodeError> {
        let total = pipelines.len();
        let (events_tx, mut events_rx) = mpsc::channel(total.max(1));

        let forward = async {
            let mut completed = 0;
            while let Some(PipelineEvent::Finished { .. }) = events_rx.recv().await {
                completed += 1;
                send(progress_tx, TranscodeProgress::TrackEncoded { completed, total });
            }
        };

        let (result, ()) = tokio::join!(
            self.executor.execute_with_events(pipelines, events_tx),
            forward
        );
        let report = result?;
        debug!(
            "{} pipelines finished in {} ms",
            report.pipelines, report.duration_ms
        );
        Ok(())
    }
}

/// Entry guard: the destination must be new and its parent must exist.
fn check_destination(destination: &Path) -> Result<(), DestinationConflict> {
    // `exists()` follows symlinks; a dangling link still occupies the name.
    if std::fs::symlink_metadata(destination).is_ok() {
        return Err(DestinationConflict::Exists(destination.to_path_buf()));
    }
    let parent = match destination.parent() {
        Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
        Some(p) => p.to_path_buf(),
        None => return Err(DestinationConflict::ParentMissing(destination.to_path_buf())),
    };
    if !parent.is_dir() {
        return Err(DestinationConflict::ParentMissing(parent));
    }
    Ok(())
}

/// Removes a partially built destination tree.
async fn rollback(destination: &Path) {
    warn!("Rolling back {}", destination.display());
    match tokio::fs::remove_dir_all(destination).await {
        Ok(()) => {
            metrics::ROLLBACKS_TOTAL.with_label_values(&["success"]).inc();
        }
        Err(e) => {
            metrics::ROLLBACKS_TOTAL.with_label_values(&["failed"]).inc();
            error!(
                rollback_failed = true,
                "Failed to remove {}: {}",
                destination.display(),
                e
            );
        }
    }
}

fn describe(spec: &PipelineSpec) -> String {
    spec.stages
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn enter(progress_tx: Option<&mpsc::Sender<TranscodeProgress>>, stage: TranscodeStage) {
    debug!("Entering stage {}", stage);
    send(progress_tx, TranscodeProgress::Stage { stage });
}

/// Reports progress without waiting; updates are dropped while the channel
/// is full or closed.
fn send(progress_tx: Option<&mpsc::Sender<TranscodeProgress>>, progress: TranscodeProgress) {
    if let Some(tx) = progress_tx {
        if let Err(e) = tx.try_send(progress) {
            debug!("Progress update dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_destination_rejects_existing() {
        let temp = TempDir::new().unwrap();
        let err = check_destination(temp.path()).unwrap_err();
        assert_eq!(err, DestinationConflict::Exists(temp.path().to_path_buf()));
    }

    #[cfg(unix)]
    #[test]
    fn test_check_destination_rejects_dangling_symlink() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        std::os::unix::fs::symlink(temp.path().join("gone"), &dest).unwrap();
        assert!(!dest.exists());

        let err = check_destination(&dest).unwrap_err();
        assert_eq!(err, DestinationConflict::Exists(dest));
    }

    #[test]
    fn test_check_destination_requires_parent() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing/out");
        let err = check_destination(&dest).unwrap_err();
        assert_eq!(
            err,
            DestinationConflict::ParentMissing(temp.path().join("missing"))
        );
    }

    #[test]
    fn test_check_destination_accepts_new_child() {
        let temp = TempDir::new().unwrap();
        check_destination(&temp.path().join("out")).unwrap();
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected_without_side_effects() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let err = Transcoder::with_defaults()
            .transcode(&temp.path().join("nope"), &dest, TargetFormat::Mp3V0)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::TrackRead(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_empty_source_is_rejected() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir(&src).unwrap();
        let dest = temp.path().join("out");

        let (tx, mut rx) = mpsc::channel(16);
        let err = Transcoder::with_defaults()
            .transcode_with_progress(&src, &dest, TargetFormat::Flac16, tx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::Validation(crate::validator::ValidationError::NoTracks { .. })
        ));
        assert!(!dest.exists());

        let mut last = None;
        while let Ok(p) = rx.try_recv() {
            last = Some(p);
        }
        assert!(matches!(
            last,
            Some(TranscodeProgress::Failed {
                stage: TranscodeStage::Validating,
                ..
            })
        ));
    }
}
