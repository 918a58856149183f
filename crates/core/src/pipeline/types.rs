//! Types for the pipeline module.

use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::error::PipelineError;

/// One external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    /// Program to execute (looked up in `PATH` when relative).
    pub program: PathBuf,
    /// Arguments, passed verbatim.
    pub args: Vec<OsString>,
}

impl StageCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Arguments as (lossy) UTF-8 strings.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    /// Builds the tokio command. Stdio wiring is left to the caller.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program_name()))?;
        for arg in self.args_lossy() {
            write!(f, " {}", shell_quote(&arg))?;
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// The process chain producing one output file from one source track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    /// Position of the track in its track set.
    pub index: usize,
    /// Source track.
    pub source: PathBuf,
    /// Output file written by the last stage.
    pub destination: PathBuf,
    /// Stages in stream order: decode (and resample), then encode.
    pub stages: Vec<StageCommand>,
}

impl PipelineSpec {
    /// Creates the output file's parent directories.
    pub async fn prepare(&self) -> Result<(), PipelineError> {
        if let Some(parent) = self.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Source file name for progress and logs.
    pub fn source_name(&self) -> String {
        file_name(&self.source)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Notification sent by the executor while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Every stage of the pipeline exited successfully.
    Finished { index: usize, destination: PathBuf },
}

/// Summary of a successful executor run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Number of pipelines run.
    pub pipelines: usize,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_command_display_quotes() {
        let cmd = StageCommand::new("flac")
            .args(["-dcs", "--"])
            .arg(Path::new("/music/01 - It's.flac"));
        assert_eq!(cmd.to_string(), r"flac -dcs -- '/music/01 - It'\''s.flac'");
    }

    #[test]
    fn test_stage_command_args() {
        let cmd = StageCommand::new("lame").arg("-S").args(vec!["-V", "0"]);
        assert_eq!(cmd.program_name(), "lame");
        assert_eq!(cmd.args_lossy(), vec!["-S", "-V", "0"]);
    }

    #[tokio::test]
    async fn test_prepare_creates_parent_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let spec = PipelineSpec {
            index: 0,
            source: PathBuf::from("/src/CD1/01.flac"),
            destination: temp.path().join("out/CD1/01.mp3"),
            stages: Vec::new(),
        };
        spec.prepare().await.unwrap();
        assert!(temp.path().join("out/CD1").is_dir());
        assert!(!spec.destination.exists());
        assert_eq!(spec.source_name(), "01.flac");
    }
}
