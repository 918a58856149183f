//! Concurrent, fail-fast execution of process chains.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::chain::ProcessChain;
use super::error::PipelineError;
use super::types::{ExecutionReport, PipelineEvent, PipelineSpec};
use crate::metrics;

/// Runs [`PipelineSpec`]s concurrently, at most `max_parallel` at a time.
///
/// The first failing pipeline cancels the run: every other chain in flight is
/// killed, queued pipelines are never started, and the originating error is
/// returned once all workers have stopped.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    max_parallel: usize,
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl PipelineExecutor {
    /// Creates an executor with the given worker bound (minimum 1).
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Runs every pipeline to completion or until the first failure.
    pub async fn execute(
        &self,
        pipelines: Vec<PipelineSpec>,
    ) -> Result<ExecutionReport, PipelineError> {
        self.run(pipelines, None).await
    }

    /// Like [`execute`](Self::execute), reporting each finished pipeline.
    ///
    /// Events are sent with `try_send`; a full or closed channel never stalls
    /// the run.
    pub async fn execute_with_events(
        &self,
        pipelines: Vec<PipelineSpec>,
        events_tx: mpsc::Sender<PipelineEvent>,
    ) -> Result<ExecutionReport, PipelineError> {
        self.run(pipelines, Some(events_tx)).await
    }

    async fn run(
        &self,
        pipelines: Vec<PipelineSpec>,
        events_tx: Option<mpsc::Sender<PipelineEvent>>,
    ) -> Result<ExecutionReport, PipelineError> {
        let start = Instant::now();
        let total = pipelines.len();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);

        let mut workers = JoinSet::new();
        for spec in pipelines {
            workers.spawn(run_pipeline(
                spec,
                Arc::clone(&semaphore),
                Arc::clone(&cancel_tx),
                cancel_rx.clone(),
                events_tx.clone(),
            ));
        }

        let mut failure: Option<PipelineError> = None;
        let mut succeeded = 0usize;
        let mut cancelled_count = 0usize;

        while let Some(joined) = workers.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(PipelineError::Worker(e.to_string())));
            match outcome {
                Ok(()) => {
                    succeeded += 1;
                    metrics::PIPELINES_TOTAL.with_label_values(&["success"]).inc();
                }
                Err(PipelineError::Cancelled) => {
                    cancelled_count += 1;
                    metrics::PIPELINES_TOTAL
                        .with_label_values(&["cancelled"])
                        .inc();
                }
                Err(e) => {
                    metrics::PIPELINES_TOTAL.with_label_values(&["failed"]).inc();
                    if failure.is_none() {
                        warn!("Pipeline failed, cancelling the remaining ones: {}", e);
                        let _ = cancel_tx.send(true);
                        failure = Some(e);
                    } else {
                        debug!("Further pipeline failure during cancellation: {}", e);
                    }
                }
            }
        }

        if let Some(err) = failure {
            warn!(
                total,
                succeeded,
                cancelled = cancelled_count,
                "Pipeline run aborted after first failure"
            );
            return Err(err);
        }

        let report = ExecutionReport {
            pipelines: total,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            pipelines = report.pipelines,
            duration_ms = report.duration_ms,
            "All pipelines finished"
        );
        Ok(report)
    }
}

/// Resolves once cancellation is requested; never if the sender is gone.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    if cancel_rx.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run_pipeline(
    spec: PipelineSpec,
    semaphore: Arc<Semaphore>,
    cancel_tx: Arc<watch::Sender<bool>>,
    mut cancel_rx: watch::Receiver<bool>,
    events_tx: Option<mpsc::Sender<PipelineEvent>>,
) -> Result<(), PipelineError> {
    let _permit = tokio::select! {
        permit = semaphore.acquire_owned() => permit.map_err(|_| PipelineError::Cancelled)?,
        _ = cancelled(&mut cancel_rx) => return Err(PipelineError::Cancelled),
    };
    if *cancel_rx.borrow() {
        return Err(PipelineError::Cancelled);
    }

    // Cancel before the permit is released so no queued pipeline starts.
    let result = drive_pipeline(&spec, &mut cancel_rx, events_tx).await;
    if matches!(&result, Err(e) if !matches!(e, PipelineError::Cancelled)) {
        let _ = cancel_tx.send(true);
    }
    result
}

async fn drive_pipeline(
    spec: &PipelineSpec,
    cancel_rx: &mut watch::Receiver<bool>,
    events_tx: Option<mpsc::Sender<PipelineEvent>>,
) -> Result<(), PipelineError> {
    debug!(
        pipeline = spec.index,
        "Transcoding {} -> {}",
        spec.source.display(),
        spec.destination.display()
    );
    let mut chain = ProcessChain::spawn(spec).await?;

    let waited = tokio::select! {
        result = chain.wait() => Some(result),
        _ = cancelled(cancel_rx) => None,
    };

    match waited {
        Some(result) => {
            result?;
            if let Some(tx) = events_tx {
                let _ = tx.try_send(PipelineEvent::Finished {
                    index: spec.index,
                    destination: spec.destination.clone(),
                });
            }
            Ok(())
        }
        None => {
            debug!(pipeline = spec.index, "Killing cancelled pipeline");
            chain.kill().await;
            Err(PipelineError::Cancelled)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::StageCommand;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    fn sh(script: String) -> StageCommand {
        StageCommand::new("sh").arg("-c").arg(script)
    }

    fn copy_spec(index: usize, dir: &Path, stage1: &str) -> PipelineSpec {
        let destination = dir.join(format!("{}.out", index));
        PipelineSpec {
            index,
            source: PathBuf::from(format!("/src/{}.flac", index)),
            destination: destination.clone(),
            stages: vec![
                sh(stage1.to_string()),
                sh(format!("cat > '{}'", destination.display())),
            ],
        }
    }

    #[tokio::test]
    async fn test_all_pipelines_succeed() {
        let temp = TempDir::new().unwrap();
        let specs: Vec<_> = (0..5)
            .map(|i| copy_spec(i, temp.path(), &format!("printf 'track {}'", i)))
            .collect();

        let (tx, mut rx) = mpsc::channel(16);
        let report = PipelineExecutor::new(2)
            .execute_with_events(specs, tx)
            .await
            .unwrap();
        assert_eq!(report.pipelines, 5);

        for i in 0..5 {
            let content = std::fs::read_to_string(temp.path().join(format!("{}.out", i))).unwrap();
            assert_eq!(content, format!("track {}", i));
        }

        let mut finished = Vec::new();
        while let Ok(PipelineEvent::Finished { index, .. }) = rx.try_recv() {
            finished.push(index);
        }
        finished.sort();
        assert_eq!(finished, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_empty_run_succeeds() {
        let report = PipelineExecutor::new(4).execute(Vec::new()).await.unwrap();
        assert_eq!(report.pipelines, 0);
    }

    #[tokio::test]
    async fn test_first_failure_cancels_the_rest() {
        let temp = TempDir::new().unwrap();
        let mut specs: Vec<_> = (0..4)
            .map(|i| copy_spec(i, temp.path(), "exec sleep 30"))
            .collect();
        specs.push(copy_spec(4, temp.path(), "echo broken >&2; exit 2"));

        let started = Instant::now();
        let err = PipelineExecutor::new(8).execute(specs).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(20));
        match err {
            PipelineError::StageFailed {
                path, code, stderr, ..
            } => {
                assert_eq!(path, PathBuf::from("/src/4.flac"));
                assert_eq!(code, 2);
                assert_eq!(stderr.as_deref(), Some("broken"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_queued_pipelines_never_start_after_failure() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("started");
        let mut specs = vec![copy_spec(0, temp.path(), "exit 1")];
        for i in 1..4 {
            specs.push(copy_spec(
                i,
                temp.path(),
                &format!("touch '{}'; exec sleep 30", marker.display()),
            ));
        }

        let result = PipelineExecutor::new(1).execute(specs).await;
        assert!(result.is_err());
        assert!(!marker.exists());
    }

    #[test]
    fn test_parallelism_floor() {
        assert_eq!(PipelineExecutor::new(0).max_parallel(), 1);
        assert!(PipelineExecutor::default().max_parallel() >= 1);
    }
}
