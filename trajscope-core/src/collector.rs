//! Discovery of trajectory files inside a single directory.
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrajError};

/// One persisted episode on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrajectoryFile {
    path: PathBuf,
}

impl TrajectoryFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file, or the empty path for a bare file name.
    #[must_use]
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Full file name including the extension.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// File name without its final extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }
}

/// List the files in `dir` whose extension equals `extension`.
///
/// Results are sorted by file name so that callers see the same discovery
/// order on every platform. An existing directory without matches yields an
/// empty list.
///
/// # Errors
///
/// Returns [`TrajError::DirectoryNotFound`] if `dir` is not an existing
/// directory, or [`TrajError::Io`] if it cannot be read.
pub fn collect_trajectory_files(dir: &Path, extension: &str) -> Result<Vec<TrajectoryFile>> {
    if !dir.is_dir() {
        return Err(TrajError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|err| TrajError::io(dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| TrajError::io(dir, err))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
            files.push(TrajectoryFile::new(path));
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(b.file_name()));
    log::debug!(
        "collected {} .{extension} files from {}",
        files.len(),
        dir.display()
    );
    Ok(files)
}
