//! Episode records and the readers that hydrate them.
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::BufReader;

use crate::collector::TrajectoryFile;
use crate::error::{Result, TrajError};

/// Per-step info recorded alongside each reward.
///
/// The `prev_level_*` fields only appear on the first step of an episode that
/// follows another one, and describe how that previous episode ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub level_seed: i64,
    pub level_progress: f64,
    pub level_progress_max: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub prev_level_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_level_progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_level_progress_max: Option<f64>,
}

impl StepInfo {
    #[must_use]
    pub const fn new(level_seed: i64, level_progress: f64, level_progress_max: f64) -> Self {
        Self {
            level_seed,
            level_progress,
            level_progress_max,
            prev_level_complete: None,
            prev_level_progress: None,
            prev_level_progress_max: None,
        }
    }

    /// Attach the previous episode's final state.
    #[must_use]
    pub fn with_previous(mut self, complete: bool, progress: f64, progress_max: f64) -> Self {
        self.prev_level_complete = Some(complete);
        self.prev_level_progress = Some(progress);
        self.prev_level_progress_max = Some(progress_max);
        self
    }
}

/// Recorders emit the completion flag as either a boolean or a 0/1 integer.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    }))
}

#[derive(Deserialize)]
struct RawEpisodeRecord {
    #[serde(alias = "reward")]
    rewards: Vec<f64>,
    #[serde(alias = "info")]
    steps: Vec<StepInfo>,
}

impl TryFrom<RawEpisodeRecord> for EpisodeRecord {
    type Error = String;

    fn try_from(raw: RawEpisodeRecord) -> std::result::Result<Self, Self::Error> {
        Self::new(raw.rewards, raw.steps)
    }
}

/// One hydrated episode.
///
/// Construction guarantees a non-empty episode with one info record per reward
/// and a single level seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEpisodeRecord")]
pub struct EpisodeRecord {
    rewards: Vec<f64>,
    steps: Vec<StepInfo>,
}

impl EpisodeRecord {
    /// Build a record, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated invariant if the episode is
    /// empty, the series lengths differ, or the level seed changes mid-episode.
    pub fn new(rewards: Vec<f64>, steps: Vec<StepInfo>) -> std::result::Result<Self, String> {
        if rewards.len() != steps.len() {
            return Err(format!(
                "reward series has {} entries but info series has {}",
                rewards.len(),
                steps.len()
            ));
        }
        let Some(first) = steps.first() else {
            return Err("episode has no steps".to_string());
        };
        if let Some((idx, step)) = steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.level_seed != first.level_seed)
        {
            return Err(format!(
                "level seed changes from {} to {} at step {idx}",
                first.level_seed, step.level_seed
            ));
        }
        Ok(Self { rewards, steps })
    }

    #[must_use]
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    #[must_use]
    pub fn steps(&self) -> &[StepInfo] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    #[must_use]
    pub fn level_seed(&self) -> i64 {
        self.first_step().level_seed
    }

    #[must_use]
    pub fn first_step(&self) -> &StepInfo {
        &self.steps[0]
    }

    #[must_use]
    pub fn last_step(&self) -> &StepInfo {
        &self.steps[self.steps.len() - 1]
    }
}

/// Source of episode records for one on-disk encoding.
pub trait RecordReader {
    /// File extension, without the dot, identifying trajectory files.
    fn extension(&self) -> &str;

    /// Hydrate one trajectory file.
    ///
    /// # Errors
    ///
    /// Returns [`TrajError::Io`] if the file cannot be opened and
    /// [`TrajError::CorruptRecord`] if it cannot be decoded or breaks a
    /// record invariant.
    fn read_episode(&self, file: &TrajectoryFile) -> Result<EpisodeRecord>;
}

/// Reads episodes stored as JSON objects with `rewards`/`steps` arrays
/// (`reward`/`info` are accepted as aliases).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordReader;

impl RecordReader for JsonRecordReader {
    fn extension(&self) -> &str {
        "json"
    }

    fn read_episode(&self, file: &TrajectoryFile) -> Result<EpisodeRecord> {
        let path = file.path();
        let handle = File::open(path).map_err(|err| TrajError::io(path, err))?;
        let record: EpisodeRecord = serde_json::from_reader(BufReader::new(handle))
            .map_err(|err| TrajError::corrupt(path, err.to_string()))?;
        log::debug!(
            "loaded {} ({} steps, seed {})",
            path.display(),
            record.len(),
            record.level_seed()
        );
        Ok(record)
    }
}

/// Hydrate every file of an ordered session, stopping at the first failure.
///
/// # Errors
///
/// Propagates the reader's error for the first file that fails to load.
pub fn load_episodes<R>(reader: &R, files: &[TrajectoryFile]) -> Result<Vec<EpisodeRecord>>
where
    R: RecordReader + ?Sized,
{
    files.iter().map(|file| reader.read_episode(file)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &std::path::Path, name: &str, body: &str) -> TrajectoryFile {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        TrajectoryFile::new(path)
    }

    #[test]
    fn reads_recorder_style_keys_and_ignores_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write(
            tmp.path(),
            "000000001.json",
            r#"{
                "reward": [0.0, 10.0],
                "info": [
                    {"level_seed": 7, "level_progress": 3, "level_progress_max": 3,
                     "prev_level_complete": 1, "prev_level_progress": 45,
                     "prev_level_progress_max": 50, "rgb": [[[0, 0, 0]]]},
                    {"level_seed": 7, "level_progress": 9, "level_progress_max": 9,
                     "rgb": [[[1, 1, 1]]]}
                ]
            }"#,
        );

        let record = JsonRecordReader.read_episode(&file).unwrap();
        assert_eq!(record.len(), 2);
        assert!((record.total_reward() - 10.0).abs() < f64::EPSILON);
        assert_eq!(record.level_seed(), 7);
        assert_eq!(record.first_step().prev_level_complete, Some(true));
        assert_eq!(record.first_step().prev_level_progress, Some(45.0));
        assert_eq!(record.last_step().prev_level_complete, None);
    }

    #[test]
    fn accepts_boolean_completion_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write(
            tmp.path(),
            "000000000.json",
            r#"{"rewards": [1.0], "steps": [{"level_seed": 1, "level_progress": 0,
                "level_progress_max": 0, "prev_level_complete": false,
                "prev_level_progress": 12, "prev_level_progress_max": 20}]}"#,
        );
        let record = JsonRecordReader.read_episode(&file).unwrap();
        assert_eq!(record.first_step().prev_level_complete, Some(false));
    }

    #[test]
    fn rejects_length_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write(
            tmp.path(),
            "000000000.json",
            r#"{"rewards": [1.0, 2.0], "steps": [{"level_seed": 1, "level_progress": 0,
                "level_progress_max": 0}]}"#,
        );
        let err = JsonRecordReader.read_episode(&file).unwrap_err();
        match err {
            TrajError::CorruptRecord { path, reason } => {
                assert_eq!(path, file.path());
                assert!(reason.contains("reward series has 2 entries"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_changing_level_seed() {
        let steps = vec![StepInfo::new(3, 0.0, 0.0), StepInfo::new(4, 1.0, 1.0)];
        let err = EpisodeRecord::new(vec![0.0, 0.0], steps).unwrap_err();
        assert!(err.contains("level seed changes from 3 to 4 at step 1"));
    }

    #[test]
    fn rejects_empty_episode() {
        let err = EpisodeRecord::new(Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, "episode has no steps");
    }

    #[test]
    fn undecodable_file_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write(tmp.path(), "000000000.json", "not json");
        let err = JsonRecordReader.read_episode(&file).unwrap_err();
        assert!(matches!(err, TrajError::CorruptRecord { .. }));
    }

    #[test]
    fn vanished_file_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = TrajectoryFile::new(tmp.path().join("000000000.json"));
        let err = JsonRecordReader.read_episode(&file).unwrap_err();
        assert!(matches!(err, TrajError::Io { .. }));
    }

    #[test]
    fn progress_is_not_assumed_monotonic() {
        let steps = vec![
            StepInfo::new(5, 40.0, 40.0),
            StepInfo::new(5, 10.0, 40.0),
        ];
        let record = EpisodeRecord::new(vec![0.0, 0.0], steps).unwrap();
        assert!((record.last_step().level_progress - 10.0).abs() < f64::EPSILON);
    }
}
