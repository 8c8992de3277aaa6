//! Grouping a root directory into chronologically ordered sessions.
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collector::{TrajectoryFile, collect_trajectory_files};
use crate::error::{Result, TrajError};
use crate::order::order_sequence;

/// Directory name format used by recorders that append one folder per session.
pub const SESSION_DIR_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// One continuous run of episodes, in play order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub dir: PathBuf,
    /// Creation time parsed from the directory name; `None` for a flat root.
    pub started_at: Option<NaiveDateTime>,
    pub episodes: Vec<TrajectoryFile>,
}

impl Session {
    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

/// Parse a session directory name such as `2021-01-01-00-00-00`.
#[must_use]
pub fn parse_session_timestamp(name: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(name, SESSION_DIR_FORMAT).ok()
}

/// Split `root` into sessions.
///
/// A root that directly holds trajectory files is one session. Otherwise each
/// immediate subdirectory named with [`SESSION_DIR_FORMAT`] is a session;
/// other entries are ignored and timestamped directories without data are
/// skipped with a warning.
///
/// # Errors
///
/// Propagates collection and ordering errors from the root or from any
/// timestamped subdirectory.
pub fn group_sessions(root: &Path, extension: &str) -> Result<Vec<Session>> {
    let root_files = collect_trajectory_files(root, extension)?;
    if !root_files.is_empty() {
        let episodes = order_sequence(root, root_files, extension)?;
        return Ok(vec![Session {
            dir: root.to_path_buf(),
            started_at: None,
            episodes,
        }]);
    }

    let mut candidates = timestamped_subdirs(root)?;
    // Stable, so equal timestamps keep name order.
    candidates.sort_by_key(|(started_at, _)| *started_at);

    let mut sessions = Vec::with_capacity(candidates.len());
    for (started_at, dir) in candidates {
        let files = collect_trajectory_files(&dir, extension)?;
        if files.is_empty() {
            log::warn!(
                "directory {} has a valid timestamp name but contains no data",
                dir.display()
            );
            continue;
        }
        let episodes = order_sequence(&dir, files, extension)?;
        sessions.push(Session {
            dir,
            started_at: Some(started_at),
            episodes,
        });
    }

    log::debug!(
        "found {} timestamped sessions under {}",
        sessions.len(),
        root.display()
    );
    Ok(sessions)
}

fn timestamped_subdirs(root: &Path) -> Result<Vec<(NaiveDateTime, PathBuf)>> {
    let entries = fs::read_dir(root).map_err(|err| TrajError::io(root, err))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| TrajError::io(root, err))?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(started_at) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_session_timestamp)
        else {
            continue;
        };
        dirs.push((started_at, path));
    }
    dirs.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), "{}").unwrap();
    }

    #[test]
    fn parses_session_directory_names() {
        let ts = parse_session_timestamp("2020-06-15-12-30-00").unwrap();
        assert_eq!(ts.format("%Y/%m/%d %H:%M:%S").to_string(), "2020/06/15 12:30:00");
        assert!(parse_session_timestamp("not-a-date").is_none());
        assert!(parse_session_timestamp("2020-13-15-12-30-00").is_none());
    }

    #[test]
    fn flat_root_is_one_session() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "000000001.json");
        touch(tmp.path(), "000000000.json");
        touch(&tmp.path().join("2020-06-15-12-30-00"), "000000000.json");

        let sessions = group_sessions(tmp.path(), "json").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].dir, tmp.path());
        assert!(sessions[0].started_at.is_none());
        assert_eq!(sessions[0].len(), 2);
        assert_eq!(sessions[0].episodes[0].file_name(), "000000000.json");
    }

    #[test]
    fn nested_sessions_sorted_by_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("2021-01-01-00-00-00"), "p_000000000.json");
        touch(&tmp.path().join("not-a-date"), "p_000000000.json");
        touch(&tmp.path().join("2020-06-15-12-30-00"), "q_000000000.json");
        touch(&tmp.path().join("2020-06-15-12-30-00"), "q_000000001.json");

        let sessions = group_sessions(tmp.path(), "json").unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].dir.ends_with("2020-06-15-12-30-00"));
        assert!(sessions[1].dir.ends_with("2021-01-01-00-00-00"));
        assert_eq!(sessions[0].len(), 2);
    }

    #[test]
    fn empty_timestamped_directory_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("2022-02-02-02-02-02")).unwrap();
        touch(&tmp.path().join("2023-03-03-03-03-03"), "000000000.json");

        let sessions = group_sessions(tmp.path(), "json").unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].dir.ends_with("2023-03-03-03-03-03"));
    }

    #[test]
    fn root_without_sessions_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("scratch"), "000000000.json");
        fs::write(tmp.path().join("README.txt"), "notes").unwrap();

        let sessions = group_sessions(tmp.path(), "json").unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn structural_error_in_session_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("2021-01-01-00-00-00"), "a_000000001.json");

        let err = group_sessions(tmp.path(), "json").unwrap_err();
        assert!(matches!(err, TrajError::AmbiguousPrefix { .. }));
    }

    #[test]
    fn missing_root_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = group_sessions(&tmp.path().join("gone"), "json").unwrap_err();
        assert!(matches!(err, TrajError::DirectoryNotFound { .. }));
    }
}
