//! Resolving how each episode of a session ended.
//!
//! The recorder stamps an episode's final state onto the first step of the
//! episode that follows it, so resolution is a window of two records: episode
//! `i` reads its completion flag and end progress from episode `i + 1`. The
//! last episode of a session has no successor and falls back to a reward
//! threshold for its environment, or stays undetermined.
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::config::{AnalyzerConfig, SATURATED_PROGRESS};
use crate::record::EpisodeRecord;
use crate::session_info::SessionInfo;

/// Why a completion flag could not be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeterminedReason {
    /// The session has no environment name to look a threshold up by.
    NoEnvName,
    /// The environment has no configured reward threshold.
    NoThreshold,
}

impl fmt::Display for UndeterminedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnvName => write!(f, "determine by reward"),
            Self::NoThreshold => write!(
                f,
                "determine by reward (env reward threshold not implemented)"
            ),
        }
    }
}

/// Tri-state completion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum Completion {
    Complete,
    Incomplete,
    Undetermined(UndeterminedReason),
}

impl Completion {
    #[must_use]
    pub const fn from_flag(complete: bool) -> Self {
        if complete {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    #[must_use]
    pub const fn is_undetermined(self) -> bool {
        matches!(self, Self::Undetermined(_))
    }

    /// The flag when known; `None` for undetermined outcomes.
    #[must_use]
    pub const fn known(self) -> Option<bool> {
        match self {
            Self::Complete => Some(true),
            Self::Incomplete => Some(false),
            Self::Undetermined(_) => None,
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Incomplete => write!(f, "incomplete"),
            Self::Undetermined(reason) => write!(f, "undetermined: {reason}"),
        }
    }
}

/// Where the end-of-episode state was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    /// Carry-over fields on the next episode's first step.
    Successor,
    /// The episode's own last step (final episode of a session).
    FinalStep,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeOutcome {
    pub episode_length: usize,
    pub episode_reward: f64,
    pub level_seed: i64,
    pub level_complete: Completion,
    pub level_progress_at_end: f64,
    pub level_progress_max: f64,
    pub progress_source: ProgressSource,
    /// Progress was forced to full because the level was completed.
    pub progress_saturated: bool,
}

/// A successor episode without the fields describing its predecessor.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("episode {successor} is missing {field} on its first step")]
pub struct CarryOverError {
    /// Position of the successor within the session.
    pub successor: usize,
    pub field: &'static str,
}

struct EndState {
    completion: Completion,
    progress_at_end: f64,
    progress_max: f64,
    source: ProgressSource,
}

/// Resolve every episode of one session, in order.
///
/// # Errors
///
/// Returns [`CarryOverError`] if an episode other than the first lacks the
/// previous-episode fields on its first step.
pub fn resolve_outcomes(
    records: &[EpisodeRecord],
    info: &SessionInfo,
    config: &AnalyzerConfig,
) -> Result<Vec<EpisodeOutcome>, CarryOverError> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let successor = records.get(idx + 1).map(|next| (idx + 1, next));
            resolve_episode(record, successor, info, config)
        })
        .collect()
}

/// Resolve a single episode given its successor (position and record), if any.
///
/// # Errors
///
/// Returns [`CarryOverError`] if the successor lacks the previous-episode fields.
pub fn resolve_episode(
    record: &EpisodeRecord,
    successor: Option<(usize, &EpisodeRecord)>,
    info: &SessionInfo,
    config: &AnalyzerConfig,
) -> Result<EpisodeOutcome, CarryOverError> {
    let episode_reward = record.total_reward();
    let end = match successor {
        Some((position, next)) => carried_over(position, next)?,
        None => final_step_state(record, episode_reward, info, config),
    };

    let progress_saturated = config.saturate_progress && end.completion.is_complete();
    let (level_progress_at_end, level_progress_max) = if progress_saturated {
        (SATURATED_PROGRESS, SATURATED_PROGRESS)
    } else {
        (end.progress_at_end, end.progress_max)
    };

    Ok(EpisodeOutcome {
        episode_length: record.len(),
        episode_reward,
        level_seed: record.level_seed(),
        level_complete: end.completion,
        level_progress_at_end,
        level_progress_max,
        progress_source: end.source,
        progress_saturated,
    })
}

fn carried_over(position: usize, next: &EpisodeRecord) -> Result<EndState, CarryOverError> {
    let first = next.first_step();
    let missing = |field| CarryOverError {
        successor: position,
        field,
    };
    let complete = first
        .prev_level_complete
        .ok_or_else(|| missing("prev_level_complete"))?;
    let progress_at_end = first
        .prev_level_progress
        .ok_or_else(|| missing("prev_level_progress"))?;
    let progress_max = first
        .prev_level_progress_max
        .ok_or_else(|| missing("prev_level_progress_max"))?;

    Ok(EndState {
        completion: Completion::from_flag(complete),
        progress_at_end,
        progress_max,
        source: ProgressSource::Successor,
    })
}

fn final_step_state(
    record: &EpisodeRecord,
    episode_reward: f64,
    info: &SessionInfo,
    config: &AnalyzerConfig,
) -> EndState {
    let completion = match info.env_name.as_deref() {
        None => Completion::Undetermined(UndeterminedReason::NoEnvName),
        Some(env_name) => config.threshold_for(env_name).map_or(
            Completion::Undetermined(UndeterminedReason::NoThreshold),
            |threshold| Completion::from_flag(episode_reward >= threshold),
        ),
    };
    let last = record.last_step();
    EndState {
        completion,
        progress_at_end: last.level_progress,
        progress_max: last.level_progress_max,
        source: ProgressSource::FinalStep,
    }
}
