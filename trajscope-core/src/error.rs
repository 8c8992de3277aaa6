//! Error taxonomy for session reconstruction.
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broad classes of failure, used by callers to decide how to report a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller or configuration mistake (missing directory, bad config).
    Input,
    /// A directory does not follow the trajectory naming convention.
    Structural,
    /// A record or sidecar violates its content invariants.
    DataIntegrity,
}

/// Errors raised while collecting, ordering, loading or resolving episodes.
#[derive(Debug, Error)]
pub enum TrajError {
    #[error("directory {} does not exist", .path.display())]
    DirectoryNotFound { path: PathBuf },
    #[error(
        "expected exactly one first-index file ending in {token:?} in {}, found {found}",
        .dir.display()
    )]
    AmbiguousPrefix {
        dir: PathBuf,
        token: String,
        found: usize,
    },
    #[error("{} does not share the sequence prefix {prefix:?}", .path.display())]
    InconsistentPrefix { path: PathBuf, prefix: String },
    #[error("{} has a non-numeric sequence index {token:?}", .path.display())]
    MalformedIndex { path: PathBuf, token: String },
    #[error("corrupt episode record {}: {reason}", .path.display())]
    CorruptRecord { path: PathBuf, reason: String },
    #[error(
        "{} is missing the previous-episode fields ({field}) on its first step",
        .path.display()
    )]
    MissingCarryOver { path: PathBuf, field: &'static str },
    #[error("invalid session info {}: {reason}", .path.display())]
    InvalidSessionInfo { path: PathBuf, reason: String },
    #[error("invalid analyzer config: {reason}")]
    InvalidConfig { reason: String },
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrajError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DirectoryNotFound { .. } | Self::InvalidConfig { .. } => ErrorKind::Input,
            Self::AmbiguousPrefix { .. }
            | Self::InconsistentPrefix { .. }
            | Self::MalformedIndex { .. } => ErrorKind::Structural,
            Self::CorruptRecord { .. }
            | Self::MissingCarryOver { .. }
            | Self::InvalidSessionInfo { .. }
            | Self::Io { .. } => ErrorKind::DataIntegrity,
        }
    }
}

pub type Result<T, E = TrajError> = std::result::Result<T, E>;
