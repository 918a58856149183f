//! A running chain of processes connected stdout → stdin.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tracing::debug;

use super::error::PipelineError;
use super::types::PipelineSpec;

/// Bytes of stderr kept per stage for error reports.
const STDERR_TAIL_BYTES: usize = 4096;

struct RunningStage {
    program: String,
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl RunningStage {
    async fn take_stderr(&mut self) -> Option<String> {
        let handle = self.stderr.take()?;
        let text = handle.await.ok()?;
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

/// Spawned processes of one [`PipelineSpec`].
///
/// Each stage's stdout is handed to the next stage as its stdin through an
/// OS pipe, so data never passes through this process or touches disk. All
/// children are killed if the chain is dropped.
pub struct ProcessChain {
    source: PathBuf,
    stages: Vec<RunningStage>,
}

impl ProcessChain {
    /// Spawns every stage of `spec`.
    ///
    /// If a later stage fails to start, the stages already running are
    /// killed before the error is returned.
    pub async fn spawn(spec: &PipelineSpec) -> Result<Self, PipelineError> {
        let mut chain = Self {
            source: spec.source.clone(),
            stages: Vec::with_capacity(spec.stages.len()),
        };
        let last = spec.stages.len().saturating_sub(1);
        let mut upstream: Option<ChildStdout> = None;

        for (idx, stage) in spec.stages.iter().enumerate() {
            let program = stage.program_name();
            let stdin: Stdio = match upstream.take() {
                Some(stdout) => match stdout.try_into() {
                    Ok(stdio) => stdio,
                    Err(e) => {
                        chain.kill().await;
                        return Err(PipelineError::Spawn {
                            path: spec.source.clone(),
                            program,
                            source: e,
                        });
                    }
                },
                None => Stdio::null(),
            };
            let stdout = if idx == last {
                Stdio::null()
            } else {
                Stdio::piped()
            };

            debug!(pipeline = spec.index, stage = idx, "spawning: {}", stage);
            let spawned = stage
                .to_command()
                .stdin(stdin)
                .stdout(stdout)
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn();

            let mut child = match spawned {
                Ok(child) => child,
                Err(e) => {
                    chain.kill().await;
                    return Err(PipelineError::Spawn {
                        path: spec.source.clone(),
                        program,
                        source: e,
                    });
                }
            };

            upstream = child.stdout.take();
            let stderr = child.stderr.take().map(|s| tokio::spawn(drain_stderr(s)));
            chain.stages.push(RunningStage {
                program,
                child,
                stderr,
            });
        }

        Ok(chain)
    }

    /// Number of running stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Waits for every stage to exit.
    ///
    /// Succeeds only if all stages exit with status 0. Otherwise the first
    /// stage that exited with a non-zero code is reported; a stage killed by a
    /// signal is only reported when no stage failed on its own, since
    /// upstream stages die of a broken pipe when a downstream stage fails.
    pub async fn wait(&mut self) -> Result<(), PipelineError> {
        let mut failed: Option<PipelineError> = None;
        let mut killed: Option<PipelineError> = None;

        for (idx, stage) in self.stages.iter_mut().enumerate() {
            let status = stage
                .child
                .wait()
                .await
                .map_err(|e| PipelineError::Wait {
                    path: self.source.clone(),
                    program: stage.program.clone(),
                    source: e,
                })?;

            if status.success() {
                continue;
            }

            let stderr = stage.take_stderr().await;
            match status.code() {
                Some(code) if failed.is_none() => {
                    failed = Some(PipelineError::StageFailed {
                        path: self.source.clone(),
                        stage: idx,
                        program: stage.program.clone(),
                        code,
                        stderr,
                    });
                }
                None if killed.is_none() => {
                    killed = Some(PipelineError::StageKilled {
                        path: self.source.clone(),
                        stage: idx,
                        program: stage.program.clone(),
                        signal: exit_signal(&status),
                        stderr,
                    });
                }
                _ => {}
            }
        }

        match failed.or(killed) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Forcibly terminates every stage and reaps it.
    pub async fn kill(&mut self) {
        for stage in &mut self.stages {
            if let Err(e) = stage.child.kill().await {
                debug!("kill {} failed (already exited?): {}", stage.program, e);
            }
            if let Some(handle) = stage.stderr.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Reads a stage's stderr to the end, keeping only the tail.
async fn drain_stderr(mut stderr: ChildStderr) -> String {
    let mut tail: Vec<u8> = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        match stderr.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > STDERR_TAIL_BYTES {
                    let excess = tail.len() - STDERR_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }
        }
    }

    String::from_utf8_lossy(&tail).to_string()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::StageCommand;
    use tempfile::TempDir;

    fn sh(script: &str) -> StageCommand {
        StageCommand::new("sh").args(["-c", script])
    }

    fn spec(stages: Vec<StageCommand>) -> PipelineSpec {
        PipelineSpec {
            index: 0,
            source: PathBuf::from("/src/01.flac"),
            destination: PathBuf::from("/dev/null"),
            stages,
        }
    }

    #[tokio::test]
    async fn test_stdout_streams_into_next_stage() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out.txt");
        let spec = spec(vec![
            sh("printf 'hello pipe'"),
            sh(&format!("cat > '{}'", out.display())),
        ]);

        let mut chain = ProcessChain::spawn(&spec).await.unwrap();
        assert_eq!(chain.len(), 2);
        chain.wait().await.unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello pipe");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reported_with_stderr() {
        let spec = spec(vec![sh("echo decoding; exit 0"), sh("echo 'bad input' >&2; exit 3")]);

        let mut chain = ProcessChain::spawn(&spec).await.unwrap();
        match chain.wait().await {
            Err(PipelineError::StageFailed {
                stage, code, stderr, ..
            }) => {
                assert_eq!(stage, 1);
                assert_eq!(code, 3);
                assert_eq!(stderr.as_deref(), Some("bad input"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_downstream_failure_preferred_over_broken_pipe() {
        // The producer never stops; it dies of SIGPIPE once the consumer exits.
        let spec = spec(vec![sh("exec yes"), sh("head -c 10 > /dev/null; exit 7")]);

        let mut chain = ProcessChain::spawn(&spec).await.unwrap();
        match chain.wait().await {
            Err(PipelineError::StageFailed { stage, code, .. }) => {
                assert_eq!(stage, 1);
                assert_eq!(code, 7);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let spec = spec(vec![
            sh("sleep 30"),
            StageCommand::new("/nonexistent/definitely-not-a-codec"),
        ]);

        let err = ProcessChain::spawn(&spec).await.err().unwrap();
        assert!(matches!(err, PipelineError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_kill_terminates_all_stages() {
        let spec = spec(vec![sh("sleep 30"), sh("sleep 30")]);

        let mut chain = ProcessChain::spawn(&spec).await.unwrap();
        let started = std::time::Instant::now();
        chain.kill().await;
        assert!(chain.wait().await.is_err());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
