//! Analyzer configuration.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, TrajError};

/// Minimum episode reward that implies the level was solved, per environment.
pub const DEFAULT_REWARD_THRESHOLDS: &[(&str, f64)] = &[
    ("climber", 10.0),
    ("coinrun", 10.0),
    ("heist", 10.0),
    ("leaper", 10.0),
];

/// Progress value reported for completed levels when saturation is enabled.
pub const SATURATED_PROGRESS: f64 = 100.0;

/// Settings that drive outcome resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Keys are environment names, matched case-insensitively.
    #[serde(default = "AnalyzerConfig::default_thresholds")]
    pub thresholds: BTreeMap<String, f64>,
    /// Report completed episodes at full progress instead of raw values.
    #[serde(default)]
    pub saturate_progress: bool,
}

impl AnalyzerConfig {
    fn default_thresholds() -> BTreeMap<String, f64> {
        DEFAULT_REWARD_THRESHOLDS
            .iter()
            .map(|(name, threshold)| ((*name).to_string(), *threshold))
            .collect()
    }

    #[must_use]
    pub fn with_saturation(mut self, saturate_progress: bool) -> Self {
        self.saturate_progress = saturate_progress;
        self
    }

    /// Reward threshold for `env_name`, matched case-insensitively.
    #[must_use]
    pub fn threshold_for(&self, env_name: &str) -> Option<f64> {
        self.thresholds
            .get(env_name)
            .or_else(|| {
                self.thresholds
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(env_name))
                    .map(|(_, threshold)| threshold)
            })
            .copied()
    }

    /// Parse configuration JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TrajError::InvalidConfig`] on malformed JSON or a
    /// non-finite threshold.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|err| TrajError::InvalidConfig {
                reason: err.to_string(),
            })?;
        config.thresholds = config
            .thresholds
            .into_iter()
            .map(|(name, threshold)| (name.to_lowercase(), threshold))
            .collect();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`TrajError::Io`] if the file cannot be read, otherwise as
    /// [`AnalyzerConfig::from_json_str`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| TrajError::io(path, err))?;
        Self::from_json_str(&contents)
    }

    /// Check threshold values.
    ///
    /// # Errors
    ///
    /// Returns [`TrajError::InvalidConfig`] naming the first non-finite threshold.
    pub fn validate(&self) -> Result<()> {
        if let Some((name, threshold)) = self
            .thresholds
            .iter()
            .find(|(_, threshold)| !threshold.is_finite())
        {
            return Err(TrajError::InvalidConfig {
                reason: format!("threshold for {name} must be finite (got {threshold})"),
            });
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            thresholds: Self::default_thresholds(),
            saturate_progress: false,
        }
    }
}
