//! Copying non-audio release files (artwork, logs, cue sheets) alongside
//! the transcoded tracks.

use filetime::FileTime;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Errors that abort the ancillary copy.
#[derive(Debug, Error)]
pub enum AncillaryError {
    #[error("Failed to scan {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {source_path} to {destination}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of an ancillary copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AncillaryReport {
    /// Copied files, relative to the release root.
    pub copied: Vec<PathBuf>,
    /// Permission or timestamp updates that could not be applied.
    pub warnings: Vec<String>,
}

/// Whether `path`'s extension, with its leading dot, is one of `suffixes`.
///
/// Comparison is case-sensitive.
pub fn matches_suffix(path: &Path, suffixes: &[String]) -> bool {
    let Some(extension) = path.extension() else {
        return false;
    };
    let suffix = format!(".{}", extension.to_string_lossy());
    suffixes.iter().any(|allowed| *allowed == suffix)
}

/// Copies every file under `source_root` whose extension is one of
/// `suffixes` to the same relative location under `dest_root`.
///
/// Does nothing if `dest_root` is not an existing directory. File contents
/// must copy successfully; permissions and timestamps are copied best-effort
/// and reported as warnings.
pub fn copy_ancillary(
    source_root: &Path,
    dest_root: &Path,
    suffixes: &[String],
) -> Result<AncillaryReport, AncillaryError> {
    let mut report = AncillaryReport::default();
    if !dest_root.is_dir() {
        debug!(
            "Destination {} is not a directory, skipping ancillary files",
            dest_root.display()
        );
        return Ok(report);
    }

    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry = entry.map_err(|e| AncillaryError::Walk {
            path: source_root.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() || !matches_suffix(entry.path(), suffixes) {
            continue;
        }

        let relative = match entry.path().strip_prefix(source_root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        let destination = dest_root.join(&relative);

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| AncillaryError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::copy(entry.path(), &destination).map_err(|e| AncillaryError::Copy {
            source_path: entry.path().to_path_buf(),
            destination: destination.clone(),
            source: e,
        })?;
        copy_metadata(entry.path(), &destination, &mut report.warnings);

        debug!("Copied {}", relative.display());
        report.copied.push(relative);
    }

    Ok(report)
}

fn copy_metadata(source: &Path, destination: &Path, warnings: &mut Vec<String>) {
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) => {
            push_warning(warnings, format!("{}: {}", source.display(), e));
            return;
        }
    };

    if let Err(e) = fs::set_permissions(destination, metadata.permissions()) {
        push_warning(
            warnings,
            format!("{}: could not copy permissions: {}", destination.display(), e),
        );
    }

    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_times(destination, atime, mtime) {
        push_warning(
            warnings,
            format!("{}: could not copy timestamps: {}", destination.display(), e),
        );
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{}", message);
    warnings.push(message);
}
