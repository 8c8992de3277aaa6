//! End-to-end reconstruction: root directory to resolved sessions.
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::AnalyzerConfig;
use crate::error::{Result, TrajError};
use crate::outcome::{Completion, EpisodeOutcome, resolve_outcomes};
use crate::record::{RecordReader, load_episodes};
use crate::session::{Session, group_sessions};
use crate::session_info::SessionInfo;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeReport {
    pub path: PathBuf,
    pub outcome: EpisodeOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub dir: PathBuf,
    pub started_at: Option<NaiveDateTime>,
    pub info: SessionInfo,
    pub episodes: Vec<EpisodeReport>,
}

/// Per-session counts of resolved completion states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeTally {
    pub complete: usize,
    pub incomplete: usize,
    pub undetermined: usize,
    pub total_reward: f64,
}

impl SessionReport {
    #[must_use]
    pub fn tally(&self) -> OutcomeTally {
        self.episodes
            .iter()
            .fold(OutcomeTally::default(), |mut tally, episode| {
                match episode.outcome.level_complete {
                    Completion::Complete => tally.complete += 1,
                    Completion::Incomplete => tally.incomplete += 1,
                    Completion::Undetermined(_) => tally.undetermined += 1,
                }
                tally.total_reward += episode.outcome.episode_reward;
                tally
            })
    }
}

/// Group, load and resolve every session under `root`.
///
/// # Errors
///
/// Fails on the first structural or data-integrity error in any session.
pub fn analyze_root<R>(root: &Path, reader: &R, config: &AnalyzerConfig) -> Result<Vec<SessionReport>>
where
    R: RecordReader + ?Sized,
{
    let sessions = group_sessions(root, reader.extension())?;
    sessions
        .iter()
        .map(|session| analyze_session(session, reader, config))
        .collect()
}

/// Load and resolve one session. All records are hydrated before resolution
/// since each outcome reads the following episode.
///
/// # Errors
///
/// Returns the loader's error, an invalid sidecar error, or
/// [`TrajError::MissingCarryOver`] naming the successor file.
pub fn analyze_session<R>(
    session: &Session,
    reader: &R,
    config: &AnalyzerConfig,
) -> Result<SessionReport>
where
    R: RecordReader + ?Sized,
{
    let info = SessionInfo::load(&session.dir)?;
    let records = load_episodes(reader, &session.episodes)?;
    let outcomes = resolve_outcomes(&records, &info, config).map_err(|err| {
        TrajError::MissingCarryOver {
            path: session.episodes[err.successor].path().to_path_buf(),
            field: err.field,
        }
    })?;

    log::debug!(
        "resolved {} episodes in {}",
        outcomes.len(),
        session.dir.display()
    );

    let episodes = session
        .episodes
        .iter()
        .zip(outcomes)
        .map(|(file, outcome)| EpisodeReport {
            path: file.path().to_path_buf(),
            outcome,
        })
        .collect();

    Ok(SessionReport {
        dir: session.dir.clone(),
        started_at: session.started_at,
        info,
        episodes,
    })
}
