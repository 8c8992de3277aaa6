//! Optional `info.yaml` sidecar describing a whole session.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, TrajError};

pub const SESSION_INFO_FILE: &str = "info.yaml";

pub const MAX_LEVEL_OPTIONS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_options: Option<Vec<i64>>,
}

impl SessionInfo {
    /// Load `<dir>/info.yaml`, returning empty metadata when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`TrajError::InvalidSessionInfo`] if the file exists but cannot
    /// be parsed or lists more than [`MAX_LEVEL_OPTIONS`] level options.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SESSION_INFO_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path).map_err(|err| TrajError::io(&path, err))?;
        Self::from_yaml_str(&contents).map_err(|reason| TrajError::InvalidSessionInfo {
            path: path.clone(),
            reason,
        })
    }

    /// Parse sidecar YAML. An empty document is treated as empty metadata.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, String> {
        let parsed: Option<Self> = serde_yaml::from_str(yaml).map_err(|err| err.to_string())?;
        let info = parsed.unwrap_or_default();
        if let Some(options) = &info.level_options
            && options.len() > MAX_LEVEL_OPTIONS
        {
            return Err(format!(
                "level_options has {} entries, at most {MAX_LEVEL_OPTIONS} are supported",
                options.len()
            ));
        }
        Ok(info)
    }
}
